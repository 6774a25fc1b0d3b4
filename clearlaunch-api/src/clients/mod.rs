/// Outbound service clients
///
/// Each provider sits behind an `async_trait` so handlers depend on the
/// trait object in [`crate::app::AppState`] and tests can swap in stubs.
///
/// - [`llm`]: chat-completions LLM (`LlmClient`, `OpenAiClient`)
/// - [`stripe`]: billing sessions and webhook verification (`PaymentProvider`, `StripeProvider`)
/// - [`email`]: transactional email (`Mailer`, `ResendMailer`)

pub mod email;
pub mod llm;
pub mod stripe;
