use crate::tui::api::ChatResponse;

const SEPARATOR: &str = " • ";

/// Compact token / cost / emissions summary. Absent or zero figures are left out.
pub fn usage_line(resp: &ChatResponse) -> String {
    let mut parts: Vec<String> = Vec::new();

    let (input, output) = resp
        .usage
        .as_ref()
        .map(|u| (u.input_tokens.unwrap_or(0), u.output_tokens.unwrap_or(0)))
        .unwrap_or((0, 0));
    if input > 0 || output > 0 {
        parts.push(format!("tokens {input}/{output}"));
    }
    if let Some(cost) = resp.cost_eur.filter(|c| *c != 0.0) {
        parts.push(format!("{cost:.6} €"));
    }
    if let Some(co2) = resp.est_co2e_g.filter(|g| *g != 0.0) {
        parts.push(format!("{co2:.2} gCO₂e"));
    }

    parts.join(SEPARATOR)
}
