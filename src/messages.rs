//! Wire formats for the two message channels the engine participates in.
//!
//! The control channel carries settings updates and right-click actions from
//! the extension's own trusted surfaces; every message is answered with an
//! [`Ack`] so senders can treat a missing listener as a non-error. The frame
//! channel crosses an unauthenticated boundary, so envelopes carry a fixed
//! source tag plus a per-page capability token that the top-level listener
//! validates before trusting any field.

use serde::{Deserialize, Serialize};

use crate::config::TriggerConfig;
use crate::search::SearchSettings;
use crate::theme::CustomColors;

/// Fixed source tag stamped on every frame-channel envelope.
pub const FRAME_SOURCE_TAG: &str = "linkpeek-frame";

/// Control-channel messages from the settings/background collaborators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum ControlMessage {
    UpdateLinkPreviewSettings { settings: TriggerConfig },
    UpdateCustomTheme { colors: CustomColors },
    UpdateTextSearchSettings { settings: SearchSettings },
    #[serde(rename_all = "camelCase")]
    SearchSelectedText { selected_text: String },
    #[serde(rename_all = "camelCase")]
    TranslateSelectedText { selected_text: String },
}

/// Reply to a control-channel message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub message: Option<String>,
}

impl Ack {
    pub fn ok() -> Self {
        Self {
            success: true,
            message: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
        }
    }
}

/// Pointer coordinates forwarded for placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionData {
    pub client_x: i32,
    pub client_y: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShowSummaryData {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error_tip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub position_data: Option<PositionData>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedTextData {
    pub selected_text: String,
}

/// Intent carried by a frame-channel envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum FrameMessage {
    ShowLinkSummary { data: ShowSummaryData },
    ClosePreview,
    SearchSelectedText { data: SelectedTextData },
    TranslateSelectedText { data: SelectedTextData },
}

/// One message on the window-messaging channel between an embedded frame and
/// the top-level document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameEnvelope {
    pub source: String,
    pub token: String,
    #[serde(flatten)]
    pub message: FrameMessage,
}

impl FrameEnvelope {
    pub fn new(token: impl Into<String>, message: FrameMessage) -> Self {
        Self {
            source: FRAME_SOURCE_TAG.to_string(),
            token: token.into(),
            message,
        }
    }

    /// Whether this envelope may be acted on: correct source tag and the
    /// receiver's capability token. The tag alone is spoofable by any script
    /// in a sibling frame.
    pub fn is_trusted(&self, expected_token: &str) -> bool {
        self.source == FRAME_SOURCE_TAG && self.token == expected_token
    }
}
