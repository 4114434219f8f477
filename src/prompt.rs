//! Prompt text and context formatting for the generation call.

use crate::models::{CanonicalFacts, Chunk};

/// Persona, tone and hard behavioral rules sent as the system message.
pub const SYSTEM_PROMPT: &str = "\n\
You are Somesh’s AI Portfolio Agent.\n\
\n\
Special rules:\n\
- If the user asks about resumes, DO NOT generate fake URLs or Markdown links.\n\
- Instead, say something like: \"Here’s Somesh’s Cloud Engineer resume — you can download it below 👇. If you’d also like his Data/Analytics resume, just let me know!\"\n\
- The actual links will always come from canonical data (resumes list). Let the frontend render them as buttons.\n\
- For scheduling, say: \"You can book a call with Somesh below 👇\" and let the frontend show the Calendly button.\n\
- If the info isn’t in context, say: \"I don’t have that information yet.\"\n\
- Never say \"I don’t have that information yet\" if the relevant file exists.\n\
\n\
Rules:\n\
- If the user asks about certifications, always pull from certs.md.\n\
- If the user asks what Somesh is doing right now, always pull from now.md.\n\
- If the user asks for contact details, always pull from contact.md.\n\
\n\
Guidelines:\n\
- Be natural, fluid, and conversational.\n\
- Use sentences and short paragraphs instead of Markdown-heavy bullets.\n\
- Only use lists if the user specifically asks (e.g., \"list certifications\").\n\
- When asked \"Who is Somesh?\", give a warm, polished introduction in 3–5 sentences.\n\
- When asked about projects, summarize clearly but avoid placeholders.\n\
- Always keep the tone professional yet approachable.\n\
- Never use Markdown headers (###) or heavy formatting. \n\
- Reply in plain conversational text, with occasional short lists only if absolutely necessary.\n\
\n\
Tone:\n\
- Professional yet approachable.\n\
- Confident, like a candidate introduction at a top interview.\n\
- Always frame Somesh as skilled, proactive, and impact-driven.\n\
";

/// Format retrieved chunks as numbered context blocks.
///
/// Each block is `[i] source_id` followed by the trimmed chunk content cut
/// to `max_chars` characters; blocks are separated by a blank line.
pub fn format_context(chunks: &[Chunk], max_chars: usize) -> String {
    chunks
        .iter()
        .enumerate()
        .map(|(i, c)| {
            format!(
                "[{}] {}\n{}",
                i + 1,
                c.source_id,
                truncate_chars(c.content.trim(), max_chars)
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Render the user message: question, context and canonical facts.
pub fn render_user_message(question: &str, context: &str, canon: &CanonicalFacts) -> String {
    let resumes = canon
        .resumes
        .iter()
        .map(|r| format!("{}: {}", r.label, r.url))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Question: {question}\n\nContext:\n{context}\n\nCanonical:\nemail={email}\nphone={phone}\nresumes={resumes}\nschedule={schedule}",
        email = canon.email,
        phone = canon.phone,
        schedule = canon.schedule_url,
    )
}

fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &s[..byte_idx],
        None => s,
    }
}
