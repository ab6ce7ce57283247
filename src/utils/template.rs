//! `{{name}}` placeholder rendering for configured commands and paths.

pub struct TemplateVars;

impl TemplateVars {
    pub const APP_NAME: &'static str = "app_name";
    pub const PLATFORM: &'static str = "platform";
    pub const SUFFIX: &'static str = "suffix";
    pub const ARTIFACT_NAME: &'static str = "artifact_name";
    pub const TAG: &'static str = "tag";
}

pub fn render(template: &str, variables: &[(&str, &str)]) -> String {
    let mut result = template.to_string();

    for (key, value) in variables {
        let placeholder = format!("{{{{{}}}}}", key);
        result = result.replace(&placeholder, value);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_known_placeholders() {
        let out = render(
            "dist/{{app_name}}{{suffix}}",
            &[(TemplateVars::APP_NAME, "smb3-foundry"), (TemplateVars::SUFFIX, ".exe")],
        );
        assert_eq!(out, "dist/smb3-foundry.exe");
    }

    #[test]
    fn leaves_unknown_placeholders() {
        let out = render("{{tag}}-{{app_name}}", &[(TemplateVars::APP_NAME, "x")]);
        assert_eq!(out, "{{tag}}-x");
    }
}
