//! Inline keyboard rendering.

use helpdesk_core::transport::Choice;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct InlineKeyboardMarkup {
    pub inline_keyboard: Vec<Vec<InlineKeyboardButton>>,
}

#[derive(Debug, Serialize)]
pub struct InlineKeyboardButton {
    pub text: String,
    pub callback_data: String,
}

/// One button per row, callback data carrying the encoded action.
///
/// Returns `None` for an empty choice list so the field is omitted.
pub fn inline_keyboard(choices: &[Choice]) -> Option<InlineKeyboardMarkup> {
    if choices.is_empty() {
        return None;
    }
    Some(InlineKeyboardMarkup {
        inline_keyboard: choices
            .iter()
            .map(|choice| {
                vec![InlineKeyboardButton {
                    text: choice.label.clone(),
                    callback_data: choice.action.to_string(),
                }]
            })
            .collect(),
    })
}
