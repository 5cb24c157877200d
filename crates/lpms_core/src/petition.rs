//! crates/lpms_core/src/petition.rs
//!
//! Static petition templates, placeholder substitution, optional AI rewriting
//! and the structural validator.

use serde::Serialize;
use tracing::warn;

use crate::domain::slugify;
use crate::ports::{CompletionService, ExternalServiceError};

pub const CLIENT_PLACEHOLDER: &str = "[CLIENTE]";
pub const CASE_PLACEHOLDER: &str = "[PROCESSO]";

/// Key used when no template matches the requested kind and thesis.
pub const FALLBACK_TEMPLATE: &str = "recurso-padrao";

const MIN_PETITION_CHARS: usize = 500;

const REPLICA_LICENCA_PREMIO: &str = "EXCELENTISSIMO SENHOR DOUTOR JUIZ

Vem, respeitosamente, perante Vossa Excelencia, o(a) cliente [CLIENTE], por seu advogado infra-assinado, apresentar REPLICA ao processo no [PROCESSO], relativo a demanda sobre LICENCA-PREMIO, pelos motivos de fato e de direito a seguir expostos:

I - DOS FATOS

Trata-se de acao em que o cliente busca o reconhecimento de seu direito a licenca-premio nao usufruida durante sua carreira profissional.

II - DO DIREITO

A legislacao trabalhista garante ao servidor publico o direito a licenca-premio como forma de reconhecimento ao tempo de servico prestado.

III - DO PEDIDO

Pelo exposto, requer-se a procedencia da demanda para condenar a parte adversa ao pagamento da verba devida.

Respeitosamente submetido.";

const REPLICA_ABONO_PERMANENCIA: &str = "EXCELENTISSIMO SENHOR DOUTOR JUIZ

Vem, respeitosamente, perante Vossa Excelencia, o(a) cliente [CLIENTE], por seu advogado infra-assinado, apresentar REPLICA ao processo no [PROCESSO], relativo a demanda sobre ABONO DE PERMANENCIA, pelos motivos de fato e de direito a seguir expostos:

I - DOS FATOS

O cliente faz jus ao recebimento do abono de permanencia, conforme previsao constitucional e legal.

II - DO DIREITO

O abono de permanencia e direito adquirido do servidor que se submete ao regime de aposentadoria por tempo de contribuicao.

III - DO PEDIDO

Pelo exposto, requer-se a procedencia da demanda.

Respeitosamente submetido.";

const RECURSO_PADRAO: &str = "EXCELENTISSIMO SENHOR DOUTOR PRESIDENTE DO TRIBUNAL

Vem, respeitosamente, perante Vossa Excelencia, o(a) cliente [CLIENTE], por seu advogado infra-assinado, interpor RECURSO ao processo no [PROCESSO], pelos motivos de fato e de direito a seguir expostos:

I - DOS FUNDAMENTOS DO RECURSO

A decisao recorrida contraria a jurisprudencia consolidada sobre a materia.

II - DO PEDIDO

Requer-se o provimento do recurso para reformar a decisao recorrida.

Respeitosamente submetido.";

/// The immutable table of petition templates, keyed by `<kind>-<thesis slug>`.
pub struct TemplateCatalog {
    entries: &'static [(&'static str, &'static str)],
}

static BUILTIN: [(&str, &str); 3] = [
    ("replica-licenca-premio", REPLICA_LICENCA_PREMIO),
    ("replica-abono-permanencia", REPLICA_ABONO_PERMANENCIA),
    (FALLBACK_TEMPLATE, RECURSO_PADRAO),
];

impl Default for TemplateCatalog {
    fn default() -> Self {
        Self { entries: &BUILTIN }
    }
}

impl TemplateCatalog {
    pub fn key_for(kind: &str, thesis: &str) -> String {
        format!("{}-{}", slugify(kind), slugify(thesis))
    }

    pub fn get(&self, key: &str) -> Option<&'static str> {
        self.entries
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, template)| *template)
    }

    /// The template for (kind, thesis), or the generic appeal when none matches.
    pub fn resolve(&self, kind: &str, thesis: &str) -> &'static str {
        self.get(&Self::key_for(kind, thesis))
            .or_else(|| self.get(FALLBACK_TEMPLATE))
            .unwrap_or(RECURSO_PADRAO)
    }

    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(k, _)| *k)
    }
}

/// The inputs of a petition draft.
#[derive(Debug, Clone)]
pub struct PetitionRequest {
    pub kind: String,
    pub thesis: String,
    pub client_name: String,
    pub case_number: String,
    pub additional_info: Option<String>,
}

/// Fills the template for the request without any AI involvement.
pub fn render_draft(catalog: &TemplateCatalog, request: &PetitionRequest) -> String {
    catalog
        .resolve(&request.kind, &request.thesis)
        .replace(CLIENT_PLACEHOLDER, &request.client_name)
        .replace(CASE_PLACEHOLDER, &request.case_number)
}

/// Renders the draft and, when additional information is present, asks the
/// completion service to rewrite it. Any completion failure keeps the draft.
pub async fn generate(
    catalog: &TemplateCatalog,
    completion: &dyn CompletionService,
    request: &PetitionRequest,
) -> String {
    let draft = render_draft(catalog, request);
    match request.additional_info.as_deref().map(str::trim) {
        Some(info) if !info.is_empty() => {
            improve_or_keep(completion, draft, info, &request.thesis).await
        }
        _ => draft,
    }
}

/// Fallback policy: an unusable or failed completion returns `draft` untouched.
pub async fn improve_or_keep(
    completion: &dyn CompletionService,
    draft: String,
    additional_info: &str,
    thesis: &str,
) -> String {
    match improve(completion, &draft, additional_info, thesis).await {
        Ok(improved) => improved,
        Err(e) => {
            warn!("Petition improvement unavailable, keeping the template draft: {}", e);
            draft
        }
    }
}

async fn improve(
    completion: &dyn CompletionService,
    draft: &str,
    additional_info: &str,
    thesis: &str,
) -> Result<String, ExternalServiceError> {
    let prompt = format!(
        "Voce e um advogado especialista em direito trabalhista e administrativo.\n\n\
         Melhore a seguinte peticao juridica sobre {thesis}, incorporando as informacoes adicionais fornecidas:\n\n\
         Peticao Original:\n{draft}\n\n\
         Informacoes Adicionais do Caso:\n{additional_info}\n\n\
         Mantenha a estrutura formal e torne a peticao mais robusta e fundamentada."
    );
    let improved = completion.complete(&prompt, 2000).await?;
    if improved.trim().is_empty() {
        return Err(ExternalServiceError::InvalidResponse(
            "empty completion".to_string(),
        ));
    }
    Ok(improved)
}

pub const SUMMARY_FALLBACK: &str = "Resumo nao disponivel";

/// Executive summary of a petition; falls back to a fixed notice.
pub async fn summarize(completion: &dyn CompletionService, petition: &str) -> String {
    let prompt = format!(
        "Voce e um advogado. Faca um resumo executivo da seguinte peticao juridica em no maximo 3 paragrafos:\n\n{petition}"
    );
    match completion.complete(&prompt, 500).await {
        Ok(summary) if !summary.trim().is_empty() => summary,
        Ok(_) => SUMMARY_FALLBACK.to_string(),
        Err(e) => {
            warn!("Petition summary unavailable: {}", e);
            SUMMARY_FALLBACK.to_string()
        }
    }
}

/// Extracts key points of a document for drafting; empty when unavailable.
pub async fn key_points(
    completion: &dyn CompletionService,
    content: &str,
    document_kind: &str,
) -> Vec<String> {
    let prompt = format!(
        "Voce e um analista juridico. Analise o seguinte documento de tipo \"{document_kind}\" e extraia os pontos-chave relevantes para uma peticao juridica:\n\n{content}\n\nForneca uma lista de pontos-chave em formato de topicos."
    );
    match completion.complete(&prompt, 1000).await {
        Ok(text) => text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect(),
        Err(e) => {
            warn!("Document analysis unavailable: {}", e);
            Vec::new()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Validation {
    pub valid: bool,
    pub warnings: Vec<String>,
}

/// Substring checks for the mandatory parts of a petition.
///
/// The motives check accepts the lowercase "pelos motivos" as well, so the
/// built-in templates validate clean.
pub fn validate(petition: &str) -> Validation {
    let mut warnings = Vec::new();

    if !petition.contains("EXCELENTISSIMO") {
        warnings.push("Falta saudacao formal ao juiz".to_string());
    }
    if !petition.contains("Pelos motivos") && !petition.contains("pelos motivos") {
        warnings.push("Falta introducao dos motivos".to_string());
    }
    if !petition.contains("PEDIDO") && !petition.contains("pedido") {
        warnings.push("Falta secao de pedidos".to_string());
    }
    if petition.chars().count() < MIN_PETITION_CHARS {
        warnings.push("Peticao muito curta, considere adicionar mais argumentacao".to_string());
    }

    Validation {
        valid: warnings.is_empty(),
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    struct Scripted {
        reply: Result<String, ()>,
        prompts: Mutex<Vec<String>>,
    }

    impl Scripted {
        fn ok(text: &str) -> Self {
            Self {
                reply: Ok(text.to_string()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                reply: Err(()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl CompletionService for Scripted {
        async fn complete(&self, prompt: &str, _max_tokens: u32) -> Result<String, ExternalServiceError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.reply
                .clone()
                .map_err(|_| ExternalServiceError::Request("boom".to_string()))
        }
    }

    fn request(kind: &str, thesis: &str, info: Option<&str>) -> PetitionRequest {
        PetitionRequest {
            kind: kind.to_string(),
            thesis: thesis.to_string(),
            client_name: "Joao Silva".to_string(),
            case_number: "0001234-56.2023.5.10.0001".to_string(),
            additional_info: info.map(str::to_string),
        }
    }

    #[test]
    fn replica_licenca_premio_is_the_template_with_substitutions() {
        let catalog = TemplateCatalog::default();
        let rendered = render_draft(&catalog, &request("replica", "licenca-premio", None));
        let expected = REPLICA_LICENCA_PREMIO
            .replace("[CLIENTE]", "Joao Silva")
            .replace("[PROCESSO]", "0001234-56.2023.5.10.0001");
        assert_eq!(rendered, expected);
        assert!(!rendered.contains(CLIENT_PLACEHOLDER));
    }

    #[test]
    fn thesis_label_selects_same_template_as_slug() {
        let catalog = TemplateCatalog::default();
        assert_eq!(
            catalog.resolve("replica", "Abono Permanência"),
            catalog.resolve("replica", "abono-permanencia")
        );
    }

    #[test]
    fn unknown_template_falls_back_to_generic_appeal() {
        let catalog = TemplateCatalog::default();
        assert_eq!(catalog.resolve("contestacao", "gratificacao"), RECURSO_PADRAO);
    }

    #[test]
    fn validator_accepts_the_builtin_replica() {
        let catalog = TemplateCatalog::default();
        let rendered = render_draft(&catalog, &request("replica", "licenca-premio", None));
        assert!(!rendered.contains("Pelos motivos"));
        let validation = validate(&rendered);
        assert_eq!(validation.warnings, Vec::<String>::new());
        assert!(validation.valid);
    }

    #[tokio::test]
    async fn additional_info_is_sent_for_rewriting() {
        let catalog = TemplateCatalog::default();
        let completion = Scripted::ok("PETICAO MELHORADA");
        let text = generate(
            &catalog,
            &completion,
            &request("replica", "licenca-premio", Some("Servidor com 20 anos")),
        )
        .await;
        assert_eq!(text, "PETICAO MELHORADA");
        assert_eq!(completion.calls(), 1);
    }

    #[tokio::test]
    async fn blank_additional_info_skips_the_completion_service() {
        let catalog = TemplateCatalog::default();
        let completion = Scripted::ok("unused");
        let req = request("replica", "licenca-premio", Some("   "));
        let text = generate(&catalog, &completion, &req).await;
        assert_eq!(text, render_draft(&catalog, &req));
        assert_eq!(completion.calls(), 0);
    }

    #[tokio::test]
    async fn failed_rewrite_keeps_the_draft() {
        let catalog = TemplateCatalog::default();
        let completion = Scripted::failing();
        let req = request("recurso", "gratificacao", Some("detalhes"));
        let text = generate(&catalog, &completion, &req).await;
        assert_eq!(text, render_draft(&catalog, &req));
    }

    #[tokio::test]
    async fn summary_and_key_points_fall_back() {
        let completion = Scripted::failing();
        assert_eq!(summarize(&completion, "texto").await, SUMMARY_FALLBACK);
        assert!(key_points(&completion, "texto", "contracheque").await.is_empty());
    }

    #[tokio::test]
    async fn key_points_split_non_empty_lines() {
        let completion = Scripted::ok("- ponto um\n\n- ponto dois\n");
        let points = key_points(&completion, "texto", "documento").await;
        assert_eq!(points, vec!["- ponto um".to_string(), "- ponto dois".to_string()]);
    }

    #[test]
    fn validator_reports_every_missing_part() {
        let validation = validate("Texto qualquer");
        assert!(!validation.valid);
        assert_eq!(validation.warnings.len(), 4);
    }
}
