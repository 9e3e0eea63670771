//! # Finance Advisor Chat
//!
//! A chat client that puts a personal-finance advisor persona in front of a
//! streaming large-language-model API, and can fold a summary of the user's
//! own bank transactions into every question.
//!
//! ## Core Concepts
//!
//! - **Profile**: who the advisor is talking to (student, working professional, retiree).
//!   It fixes the session's instructions and the quick replies offered after the first answer.
//! - **Session**: one ongoing conversation with the model, created per profile selection
//! - **Transactions**: `date,description,amount` rows parsed from an uploaded CSV.
//!   Malformed rows are dropped, never half-read
//! - **Summary**: count, total income and total expenses, recomputed for each message and
//!   prepended to the prompt the model sees (the transcript keeps the user's own words)
//! - **Controller**: drives one request at a time, streaming the reply into the transcript
//!
//! The Gemini transport lives behind the `gemini` feature. Anything implementing
//! [`SessionFactory`] can drive the controller.
//!
//! ## Example
//!
//! ```rust,ignore
//! use finance_advisor_chat::*;
//! use finance_advisor_chat::llm::GeminiSessionFactory;
//!
//! let mut controller = ConversationController::new(GeminiSessionFactory::from_env());
//! controller.select_profile(Profile::Student);
//! controller
//!     .attach_file("january.csv", tokio::fs::read_to_string("january.csv"))
//!     .await?;
//!
//! if let SubmitOutcome::Completed { response } = controller.submit("Where is my money going?").await {
//!     println!("{}", response);
//! }
//! ```

pub mod controller;
pub mod error;
pub mod ingestion;
pub mod profile;
pub mod prompts;
pub mod render;
pub mod schema;
pub mod session;
pub mod summary;
pub mod transcript;

#[cfg(feature = "gemini")]
pub mod llm;

pub use controller::{
    ConversationController, ConversationEvent, ConversationState, Phase, SubmitOutcome,
};
pub use error::{AdvisorError, Result};
pub use ingestion::parse_transactions;
pub use profile::Profile;
pub use prompts::{system_instruction, DISCLAIMER};
pub use render::{
    format_currency, format_response, transaction_table, AmountClass, TransactionRow,
    TransactionTable,
};
pub use schema::{Transaction, TransactionSummary};
pub use session::{ChatSession, ChunkStream, SessionFactory};
pub use summary::{build_prompt, context_sentence, summarize};
pub use transcript::{Entry, EntryKind, Transcript};
