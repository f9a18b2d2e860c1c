//! # extract::prompt
//!
//! The model must answer with one JSON object that deserializes straight
//! into [`AIProcessedExpense`](super::AIProcessedExpense).

const JSON_FORMAT: &str = r#"## Required JSON Format
{
  "description": "<brief summary of the expense>",
  "totalAmount": <total amount in ₹, number>,
  "payer": "<name of the person who paid the full bill>",
  "splits": [
    { "name": "<person>", "amount": <their share in ₹, number> }
  ],
  "reminders": "<a friendly, polite reminder message for the group, Hinglish or plain English>"
}

**CRITICAL**: Respond with ONLY a valid JSON object. No explanations, no markdown, no code fences."#;

/// Prompt for a free-text description such as
/// "Rahul paid 900 for dinner, split with Amit and Priya".
pub fn text_prompt(text: &str) -> String {
    format!(
        r#"Analyze this expense description and extract structured data.

## Context
Users are friends in India. Amounts are in ₹.

## Rules
1. Identify the payer.
2. Identify the total amount.
3. Split the amount among the mentioned people. Handle exclusions (e.g. "veg people don't pay for chicken").
4. The split amounts MUST add up to the total amount exactly.

## Input
"{text}"

{JSON_FORMAT}"#
    )
}

/// Prompt sent alongside a bill photo.
pub fn image_prompt() -> String {
    format!(
        r#"Scan this bill image. Extract the total amount and the items, and suggest a fair split among friends.
If the image doesn't mention names, assume "Me" as the payer and split equally between "Me" and "Friend 1".
The split amounts MUST add up to the total amount exactly.

{JSON_FORMAT}"#
    )
}
