use super::{document, html_escape, script_json};
use crate::lti::registration::{PlatformResponse, RegistrationContext};

const REGISTRATION_STYLE: &str = r#"    <style>
        body {
            font-family: system-ui, -apple-system, sans-serif;
            margin: 2rem;
            color: #333;
        }
        .platform {
            color: #666;
            font-size: 0.9rem;
        }
    </style>"#;

/// Dynamic registration landing page.
///
/// Submitting the form posts the registration endpoint and token back to
/// `finish_path`, where the registration is completed.
pub fn registration_html(context: &RegistrationContext, finish_path: &str) -> String {
    let platform = &context.platform_configuration;
    let product = &platform.lti_platform_configuration.product_family_code;

    let body = format!(
        r#"    <main>
        <h1>Register</h1>
        <p class="platform">Platform: <span id="product-family">{product}</span> ({issuer})</p>
        <form method="post" action="{action}">
            <input type="hidden" name="registration_endpoint" value="{endpoint}" />
            <input type="hidden" name="registration_token" value="{token}" />
            <button type="submit">Install</button>
        </form>
    </main>"#,
        product = html_escape(product),
        issuer = html_escape(&platform.issuer),
        action = html_escape(finish_path),
        endpoint = html_escape(&platform.registration_endpoint),
        token = html_escape(context.registration_token.as_deref().unwrap_or("")),
    );

    document("Register", REGISTRATION_STYLE, &body)
}

/// Shown after the platform accepted the registration. Tells the platform
/// the registration window can be closed.
pub fn registration_complete_html(response: &PlatformResponse) -> String {
    let client_id = response.client_id.as_deref().unwrap_or("");

    let body = format!(
        r#"    <main>
        <h1>Registration complete</h1>
        <p>Client ID: <code>{client_id}</code></p>
    </main>
    <script type="text/javascript">
        const registration = {registration};
        (window.opener || window.parent).postMessage({{ subject: 'org.imsglobal.lti.close' }}, '*');
    </script>"#,
        client_id = html_escape(client_id),
        registration = script_json(&serde_json::json!({
            "clientId": client_id,
            "deploymentId": response.deployment_id(),
        })),
    );

    document("Registration complete", REGISTRATION_STYLE, &body)
}
