//! Page signal extraction and scoring.
//!
//! Every check subtracts a fixed penalty from a perfect score and records a
//! finding. The checks are intentionally coarse; they only need to be
//! deterministic and bounded to 0..=100.

use crate::domain::audit::AuditScores;

/// Monthly revenue lost per missing score point, in whole currency units.
const LOSS_PER_POINT: u64 = 45;

/// What a single fetch revealed about a storefront.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageSignals {
    pub response_ms: u64,
    pub html_bytes: usize,
    pub uses_https: bool,
    pub scripts: usize,
    pub stylesheets: usize,
    pub images: usize,
    pub images_missing_alt: usize,
    pub has_viewport_meta: bool,
    pub has_title: bool,
    pub has_meta_description: bool,
    pub has_add_to_cart: bool,
    pub has_search: bool,
    pub has_reviews: bool,
    pub has_trust_signals: bool,
}

impl PageSignals {
    /// Extracts signals from a fetched page.
    pub fn from_html(html: &str, response_ms: u64, uses_https: bool) -> Self {
        let lower = html.to_ascii_lowercase();
        let (images, images_missing_alt) = count_images(&lower);

        Self {
            response_ms,
            html_bytes: html.len(),
            uses_https,
            scripts: lower.matches("<script").count(),
            stylesheets: lower.matches("rel=\"stylesheet\"").count()
                + lower.matches("rel='stylesheet'").count(),
            images,
            images_missing_alt,
            has_viewport_meta: lower.contains("name=\"viewport\"") || lower.contains("name='viewport'"),
            has_title: lower.contains("<title>") && !lower.contains("<title></title>"),
            has_meta_description: lower.contains("name=\"description\"")
                || lower.contains("name='description'"),
            has_add_to_cart: contains_any(&lower, &["add to cart", "add-to-cart", "addtocart", "buy now"]),
            has_search: contains_any(&lower, &["type=\"search\"", "/search", "search-form"]),
            has_reviews: contains_any(&lower, &["review", "rating", "testimonial"]),
            has_trust_signals: contains_any(
                &lower,
                &["free shipping", "secure checkout", "money-back", "returns", "guarantee"],
            ),
        }
    }
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

/// Returns (images, images without an alt attribute).
fn count_images(lower: &str) -> (usize, usize) {
    let mut total = 0;
    let mut missing_alt = 0;
    for tag in lower.split("<img").skip(1) {
        total += 1;
        let attrs = tag.split('>').next().unwrap_or("");
        if !attrs.contains("alt=") {
            missing_alt += 1;
        }
    }
    (total, missing_alt)
}

struct Tally {
    score: i32,
    findings: Vec<String>,
}

impl Tally {
    fn new() -> Self {
        Self { score: 100, findings: Vec::new() }
    }

    fn penalize(&mut self, points: i32, finding: impl Into<String>) {
        self.score -= points;
        self.findings.push(finding.into());
    }

    fn finish(self) -> (u8, Vec<String>) {
        (self.score.clamp(0, 100) as u8, self.findings)
    }
}

/// Converts signals into sub-scores and an estimated monthly loss.
pub fn score_page(signals: &PageSignals) -> AuditScores {
    let mut perf = Tally::new();

    match signals.response_ms {
        ms if ms > 3_000 => perf.penalize(30, format!("Server responded in {} ms", ms)),
        ms if ms > 1_500 => perf.penalize(15, format!("Server responded in {} ms", ms)),
        ms if ms > 800 => perf.penalize(5, format!("Server responded in {} ms", ms)),
        _ => {}
    }
    match signals.html_bytes {
        b if b > 500_000 => perf.penalize(15, format!("HTML document is {} KB", b / 1024)),
        b if b > 200_000 => perf.penalize(8, format!("HTML document is {} KB", b / 1024)),
        _ => {}
    }
    match signals.scripts {
        n if n > 30 => perf.penalize(20, format!("{} script tags on the page", n)),
        n if n > 15 => perf.penalize(10, format!("{} script tags on the page", n)),
        _ => {}
    }
    if signals.stylesheets > 10 {
        perf.penalize(5, format!("{} stylesheets block rendering", signals.stylesheets));
    }
    if signals.images_missing_alt > 0 {
        let points = (signals.images_missing_alt as i32).min(10);
        perf.penalize(
            points,
            format!("{} of {} images lack alt text", signals.images_missing_alt, signals.images),
        );
    }
    if !signals.has_viewport_meta {
        perf.penalize(10, "No mobile viewport meta tag");
    }

    let mut conv = Tally::new();
    if !signals.uses_https {
        conv.penalize(20, "Store is not served over HTTPS");
    }
    if !signals.has_add_to_cart {
        conv.penalize(25, "No add-to-cart call to action found");
    }
    if !signals.has_reviews {
        conv.penalize(15, "No reviews or ratings visible");
    }
    if !signals.has_trust_signals {
        conv.penalize(10, "No shipping, returns or guarantee messaging");
    }
    if !signals.has_search {
        conv.penalize(10, "No product search");
    }
    if !signals.has_title {
        conv.penalize(10, "Missing page title");
    }
    if !signals.has_meta_description {
        conv.penalize(10, "Missing meta description");
    }

    let (performance, performance_findings) = perf.finish();
    let (conversion, conversion_findings) = conv.finish();
    let missing_points = 200 - u64::from(performance) - u64::from(conversion);

    AuditScores::new(performance, conversion, missing_points * LOSS_PER_POINT)
        .with_findings(performance_findings, conversion_findings)
}
