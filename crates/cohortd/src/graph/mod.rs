//! Meeting provider module: token exchange, calendar-event creation with
//! a standalone-meeting fallback, and auto-recording enablement.

pub mod client;
mod error;
mod types;

pub use client::{build_http_client, GraphMeetingClient, TokenSource};
pub use error::GraphError;
pub use types::{MeetingRequest, MeetingTier, ProvisionedMeeting};

use tracing::warn;

/// Seam for meeting creation so jobs can run against fakes in tests.
#[allow(async_fn_in_trait)]
pub trait MeetingProvider {
    async fn create_calendar_meeting(&self, req: &MeetingRequest) -> Result<String, GraphError>;
    async fn create_standalone_meeting(&self, req: &MeetingRequest) -> Result<String, GraphError>;
    async fn enable_auto_recording(&self, join_url: &str) -> Result<(), GraphError>;
}

impl MeetingProvider for GraphMeetingClient {
    async fn create_calendar_meeting(&self, req: &MeetingRequest) -> Result<String, GraphError> {
        GraphMeetingClient::create_calendar_meeting(self, req).await
    }

    async fn create_standalone_meeting(&self, req: &MeetingRequest) -> Result<String, GraphError> {
        GraphMeetingClient::create_standalone_meeting(self, req).await
    }

    async fn enable_auto_recording(&self, join_url: &str) -> Result<(), GraphError> {
        GraphMeetingClient::enable_auto_recording(self, join_url).await
    }
}

/// Creates a meeting by evaluating the two tiers in order and taking the
/// first success. The calendar tier additionally gets a best-effort
/// auto-recording patch; a patch failure never fails provisioning.
pub async fn create_with_fallback<P: MeetingProvider>(
    provider: &P,
    req: &MeetingRequest,
) -> Result<ProvisionedMeeting, GraphError> {
    match provider.create_calendar_meeting(req).await {
        Ok(join_url) => {
            if let Err(e) = provider.enable_auto_recording(&join_url).await {
                warn!(
                    subject = %req.subject,
                    error = %e,
                    "Auto-recording patch failed; meeting kept without it"
                );
            }
            Ok(ProvisionedMeeting {
                join_url,
                tier: MeetingTier::CalendarEvent,
            })
        }
        Err(primary_err) => {
            warn!(
                subject = %req.subject,
                error = %primary_err,
                "Calendar meeting creation failed, trying standalone fallback"
            );
            let join_url = provider.create_standalone_meeting(req).await?;
            Ok(ProvisionedMeeting {
                join_url,
                tier: MeetingTier::Standalone,
            })
        }
    }
}
