use serde_json::json;
use tracing::{error, info};

use super::{Document, Fetch, FetchRequest, LaunchValidator};
use crate::error::ClientError;
use crate::html::{launch_content_html, DEEP_LINKING_FORM_ID, DEEP_LINK_JWT_ID, MAIN_CONTENT_ID};
use crate::lti::claims::LaunchSettings;
use crate::lti::deep_link::{decode_signed_response, DeepLinkPayload};
use crate::lti::definitions::{LTI_NAMES_AND_ROLES_PATH, LTI_SIGN_DEEP_LINK_PATH};

/// Body text shown when validation rejects the launch.
pub const FAILED_TO_LAUNCH: &str = "Failed to launch";

/// Result of [`LaunchController::start`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchOutcome {
    /// Content installed and the roster requested
    Launched,

    /// Validation rejected the launch
    Failed,

    /// The page has no main content container
    MissingContainer,
}

/// Drives a launch page.
pub struct LaunchController<V, F> {
    settings: LaunchSettings,
    validator: V,
    fetch: F,
}

impl<V, F> LaunchController<V, F>
where
    V: LaunchValidator,
    F: Fetch,
{
    pub fn new(settings: LaunchSettings, validator: V, fetch: F) -> Self {
        Self {
            settings,
            validator,
            fetch,
        }
    }

    pub fn settings(&self) -> &LaunchSettings {
        &self.settings
    }

    /// Validate the launch and show the tool.
    ///
    /// After the content is installed the course roster is requested once and
    /// logged; a roster failure does not change the outcome.
    pub async fn start<D: Document>(&self, document: &mut D) -> LaunchOutcome {
        if !self.validator.validate(&self.settings).await {
            document.set_body_text(FAILED_TO_LAUNCH);
            return LaunchOutcome::Failed;
        }

        let content = launch_content_html(self.settings.deep_linking.as_ref());
        if !document.set_inner_html(MAIN_CONTENT_ID, &content) {
            error!(element = MAIN_CONTENT_ID, "Main content element not found");
            return LaunchOutcome::MissingContainer;
        }

        let request = FetchRequest::get(LTI_NAMES_AND_ROLES_PATH, &self.settings.jwt);
        match self.fetch.fetch(request).await {
            Ok(roster) => info!(roster = %roster, "Names and roles"),
            Err(e) => error!(error = %e, "Names and roles request failed"),
        }

        LaunchOutcome::Launched
    }

    /// Return content to the platform (the Deep Link button).
    ///
    /// Signs one content item, fills the hidden `JWT` field, points the form
    /// at the platform's return URL and submits it once. Nothing on the page
    /// changes when signing fails.
    pub async fn deep_link<D: Document>(&self, document: &mut D) -> Result<(), ClientError> {
        let result = self.try_deep_link(document).await;
        if let Err(e) = &result {
            error!(error = %e, "Deep link failed");
        }
        result
    }

    async fn try_deep_link<D: Document>(&self, document: &mut D) -> Result<(), ClientError> {
        let claim = self.settings.deep_linking.as_ref().ok_or_else(|| {
            ClientError::Unavailable("launch has no deep linking settings".to_string())
        })?;

        let payload = DeepLinkPayload::for_claim(claim);
        let body = json!([payload]);

        let response = self
            .fetch
            .fetch(FetchRequest::post(
                LTI_SIGN_DEEP_LINK_PATH,
                &self.settings.jwt,
                body,
            ))
            .await?;
        let jwt = decode_signed_response(&response)?;

        if !document.set_attribute(DEEP_LINK_JWT_ID, "value", &jwt) {
            return Err(missing(DEEP_LINK_JWT_ID));
        }
        if !document.set_attribute(DEEP_LINKING_FORM_ID, "action", &claim.deep_link_return_url) {
            return Err(missing(DEEP_LINKING_FORM_ID));
        }
        if !document.submit_form(DEEP_LINKING_FORM_ID) {
            return Err(missing(DEEP_LINKING_FORM_ID));
        }

        info!(item_type = payload.type_name(), "Deep link submitted");
        Ok(())
    }
}

fn missing(id: &str) -> ClientError {
    ClientError::Unavailable(format!("element #{} not found", id))
}
