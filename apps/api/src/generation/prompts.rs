// Prompt fragments and the per-network prompt builder.
// The prompt is data for the model; it is written in the same language as
// the network style briefs so the model receives one consistent brief.

use crate::generation::networks::NetworkProfile;
use crate::generation::pipeline::GenerationRequest;

pub const COPYWRITER_PREAMBLE: &str =
    "Sos un experto en marketing de contenidos y copywriting para redes sociales.";

pub const HASHTAGS_INSTRUCTION: &str =
    "Incluí entre 4 y 6 hashtags relevantes en el campo \"hashtags\".";

pub const NO_HASHTAGS_INSTRUCTION: &str =
    "No incluyas hashtags: ni en el texto ni en el campo \"hashtags\", que debe quedar vacío.";

pub const CTA_INSTRUCTION: &str = "Incluí un llamado a la acción claro al final del texto.";

/// Output contract. The pipeline adds the `#` prefix when displaying, so tags
/// must come back bare.
pub const JSON_ONLY_INSTRUCTION: &str = r#"Respondé ÚNICAMENTE con un objeto JSON válido con este formato exacto:
{
  "text": "el texto del post",
  "hashtags": ["hashtag1", "hashtag2"]
}

Los hashtags van sin el símbolo # y nunca dentro de "text".
No uses bloques de código markdown (```), ni agregues texto antes o después del JSON."#;

/// Builds the prompt for one network. Deterministic for a given request and profile.
pub fn build_prompt(request: &GenerationRequest, profile: &NetworkProfile) -> String {
    let context_block = match request.context.as_deref().map(str::trim) {
        Some(context) if !context.is_empty() => format!("CONTEXTO ADICIONAL: {context}\n"),
        _ => String::new(),
    };

    let hashtag_instruction = if request.include_hashtags {
        HASHTAGS_INSTRUCTION
    } else {
        NO_HASHTAGS_INSTRUCTION
    };

    let cta_line = if request.include_cta {
        format!("{CTA_INSTRUCTION}\n")
    } else {
        String::new()
    };

    format!(
        "{COPYWRITER_PREAMBLE}\n\n\
         Generá UN post para {network} sobre el siguiente tema:\n\n\
         TEMA: {topic}\n\
         {context_block}\
         TONO: {tone}\n\
         ESTILO PARA ESTA RED: {style}\n\
         LÍMITE DE CARACTERES: {max_chars}\n\n\
         {hashtag_instruction}\n\
         {cta_line}\n\
         {JSON_ONLY_INSTRUCTION}",
        network = profile.identifier.to_uppercase(),
        topic = request.topic.trim(),
        tone = request.tone,
        style = profile.style_brief,
        max_chars = profile.max_chars,
    )
}
