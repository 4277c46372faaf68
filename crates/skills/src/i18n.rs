//! User-facing strings for the skills panel.

pub use clawpanel_config::Locale;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Text {
    SkillEnabled,
    SkillDisabled,
    ApiKeySaved,
    Installed,
    InstallFailed,
    ChangesSaved,
    FileSaved,
    SkillCreated,
    SkillDeleted,
    NameRequired,
    NameTooLong,
    NamePathSeparator,
    NameInvalid,
}

pub fn text(locale: Locale, key: Text) -> &'static str {
    match locale {
        Locale::ZhCn => match key {
            Text::SkillEnabled => "技能已启用",
            Text::SkillDisabled => "技能已禁用",
            Text::ApiKeySaved => "API 密钥已保存",
            Text::Installed => "安装完成",
            Text::InstallFailed => "安装失败",
            Text::ChangesSaved => "更改已保存",
            Text::FileSaved => "技能文件已保存",
            Text::SkillCreated => "技能已创建",
            Text::SkillDeleted => "技能已删除",
            Text::NameRequired => "请输入技能名称",
            Text::NameTooLong => "技能名称不能超过 64 个字符",
            Text::NamePathSeparator => "技能名称不能包含路径分隔符或 \"..\"",
            Text::NameInvalid => "只能使用小写字母、数字和连字符，且不能以连字符开头或结尾",
        },
        Locale::En => match key {
            Text::SkillEnabled => "Skill enabled",
            Text::SkillDisabled => "Skill disabled",
            Text::ApiKeySaved => "API key saved",
            Text::Installed => "Installed",
            Text::InstallFailed => "Install failed",
            Text::ChangesSaved => "Changes saved",
            Text::FileSaved => "Skill file saved",
            Text::SkillCreated => "Skill created",
            Text::SkillDeleted => "Skill deleted",
            Text::NameRequired => "Enter a skill name",
            Text::NameTooLong => "Skill names are at most 64 characters",
            Text::NamePathSeparator => "Skill names cannot contain path separators or \"..\"",
            Text::NameInvalid => {
                "Use lowercase letters, digits and hyphens, without a leading or trailing hyphen"
            },
        },
    }
}

/// Starter `SKILL.md` for a newly created skill.
pub fn skill_template(locale: Locale, name: &str) -> String {
    match locale {
        Locale::ZhCn => format!(
            "---\nname: {name}\ndescription: 简要说明这个技能做什么、何时使用\n---\n\n# {name}\n\n## 使用场景\n\n- \n\n## 步骤\n\n1. \n"
        ),
        Locale::En => format!(
            "---\nname: {name}\ndescription: Briefly describe what this skill does and when to use it\n---\n\n# {name}\n\n## When to use\n\n- \n\n## Steps\n\n1. \n"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_carries_name_in_frontmatter() {
        for locale in [Locale::ZhCn, Locale::En] {
            let body = skill_template(locale, "daily-report");
            assert!(body.starts_with("---\nname: daily-report\n"));
            assert!(body.contains("# daily-report"));
        }
    }

    #[test]
    fn locales_differ() {
        assert_ne!(
            text(Locale::ZhCn, Text::SkillEnabled),
            text(Locale::En, Text::SkillEnabled)
        );
    }
}
