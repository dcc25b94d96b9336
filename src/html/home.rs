use super::{document, html_escape};
use crate::lti::definitions::LTI_REGISTRATION_PATH;

const HOME_STYLE: &str = r#"    <style>
        * {
            box-sizing: border-box;
        }
        body {
            margin: 0 auto;
            min-height: 100vh;
            color: #333;
            font-family: system-ui, -apple-system, sans-serif;
            line-height: 1.6;
        }
        code {
            background-color: #f4f4f4;
            border-radius: 4px;
            font-size: 0.9rem;
            font-weight: 900;
            padding: 1rem;
        }
        .hero-section {
            background-color: rgb(255, 221, 0);
            text-align: center;
            padding: 4rem 2rem;
        }
        .hero-title {
            font-size: 3rem;
            font-weight: 700;
            margin-bottom: 1.5rem;
            color: #000;
        }
        .hero-description {
            font-size: 1.25rem;
            color: #000;
            opacity: 0.8;
        }
    </style>"#;

/// Home page: application name and a pointer to dynamic registration.
///
/// `script_name` is the resolved path of the home client script.
pub fn home_html(script_name: &str, application_name: &str) -> String {
    let name = html_escape(application_name);

    let body = format!(
        r#"    <main>
        <section class="hero-section">
            <h1 class="hero-title">{name}</h1>
            <p class="hero-description">An LTI 1.3 tool.</p>
            <div id="main-content">
                <div class="hero-actions">
                    Register this tool with your platform using
                    <a href="https://www.imsglobal.org/spec/lti-dr/v1p0">Dynamic Registration</a>.
                    <h3>Dynamic Registration URL:</h3>
                    <code>https://&lt;your-host&gt;{registration_path}</code>
                </div>
            </div>
        </section>
    </main>
    <script type="module" src="/{script}"></script>"#,
        registration_path = LTI_REGISTRATION_PATH,
        script = html_escape(script_name),
    );

    document(application_name, HOME_STYLE, &body)
}
