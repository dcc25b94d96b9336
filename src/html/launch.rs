use super::{document, html_escape, script_json};
use crate::lti::claims::{DeepLinkingClaim, LaunchSettings};

/// Container the launch controller fills after validation.
pub const MAIN_CONTENT_ID: &str = "main-content";

/// `<template>` holding the post-launch markup.
pub const LAUNCH_CONTENT_TEMPLATE_ID: &str = "launch-content";

pub const DEEP_LINKING_BUTTON_ID: &str = "deep-linking-button";
pub const DEEP_LINKING_FORM_ID: &str = "deep-linking-form";

/// Hidden input receiving the signed Deep Linking response (`name="JWT"`).
pub const DEEP_LINK_JWT_ID: &str = "deep-link-jwt";

/// Markup shown once a launch is validated.
///
/// The Deep Linking form has no action and an empty `JWT` value; both are
/// filled in when the user picks content.
pub fn launch_content_html(deep_linking: Option<&DeepLinkingClaim>) -> String {
    let mut html = String::from("<h1>Hello World</h1>\n");

    if deep_linking.is_some() {
        html.push_str(&format!(
            r#"<h2>Deep Linking</h2>
<button id="{button}">Deep Link</button>
<form id="{form}" method="post">
    <input id="{jwt}" type="hidden" name="JWT" value="" />
    <button id="deep-link-submit" type="submit" style="display:none;">Submit</button>
</form>
"#,
            button = DEEP_LINKING_BUTTON_ID,
            form = DEEP_LINKING_FORM_ID,
            jwt = DEEP_LINK_JWT_ID,
        ));
    }

    html
}

/// Launch page: injects `settings` as `window.LAUNCH_SETTINGS` and loads the
/// launch script at `/{script_name}`.
pub fn launch_html(settings: &LaunchSettings, script_name: &str) -> String {
    let head = format!(
        "    <script type=\"text/javascript\">\n        window.LAUNCH_SETTINGS = {};\n    </script>",
        script_json(settings)
    );

    let body = format!(
        r#"    <div id="{main}"></div>
    <template id="{template}">
{content}    </template>
    <script type="module" src="/{script}"></script>"#,
        main = MAIN_CONTENT_ID,
        template = LAUNCH_CONTENT_TEMPLATE_ID,
        content = launch_content_html(settings.deep_linking.as_ref()),
        script = html_escape(script_name),
    );

    document("Launch", &head, &body)
}
