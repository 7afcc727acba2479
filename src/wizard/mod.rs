pub mod client;
pub mod form;

use tracing::{info, warn};

pub use client::{ClientError, CoordinateClient};
pub use form::{reduce, FormAction, FormError, FormState, FormVariant, Step};

/// Submits the form: marks it loading, calls the API, then records the outcome.
///
/// Refusals from the reducer (wrong step, incomplete input, already loading) are
/// returned as errors; network and server failures end up in `FormState::error`.
pub async fn submit(state: FormState, client: &CoordinateClient) -> Result<FormState, FormError> {
    let request = state.to_request()?;
    let state = reduce(state, FormAction::SubmitStarted)?;
    let photo = match state.variant {
        FormVariant::WithPhoto => state.photo.clone(),
        FormVariant::TextOnly => None,
    };

    match client.analyze(&request, photo.as_ref(), state.language()).await {
        Ok(result) => {
            info!(
                "Styling result received: tips={} colors={}",
                result.styling_tips.len(),
                result.color_palette.len()
            );
            reduce(state, FormAction::SubmitSucceeded(result))
        }
        Err(err) => {
            warn!("Styling submission failed: {}", err);
            let message = err.user_message(state.language());
            reduce(state, FormAction::SubmitFailed(message))
        }
    }
}
