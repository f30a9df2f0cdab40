//! Canned content used by the mock engine.

use shared::domain::{ImportantClause, Importance, StepDefinition};

pub const DOCUMENT_TYPES: [&str; 5] = [
    "Employment Contract",
    "Lease Agreement",
    "Service Agreement",
    "NDA",
    "Terms of Service",
];

pub const SUMMARY: &str = "This employment contract establishes a standard employer-employee \
relationship with typical terms for a mid-level position. The agreement includes provisions for \
salary, benefits, termination procedures, and confidentiality obligations. Overall, the terms \
appear fair and balanced, though there are a few clauses that warrant attention.";

pub const PLAIN_LANGUAGE_EXPLANATION: &str = "In simple terms, this is a fairly standard job \
contract. You're agreeing to work for the company full-time in exchange for a salary and \
benefits. The company wants to protect its secrets and prevent you from working for competitors \
for a year after you leave. Most terms are reasonable, but you might want to negotiate the \
non-compete period and clarify some policies before signing.";

pub const KEY_POINTS: [&str; 5] = [
    "Fixed salary of $75,000 annually with standard benefit package",
    "90-day probationary period with at-will employment thereafter",
    "Comprehensive non-disclosure and non-compete clauses",
    "Standard intellectual property assignment to company",
    "Two weeks paid vacation in first year, increasing thereafter",
];

pub const RECOMMENDATIONS: [&str; 4] = [
    "Consider negotiating the non-compete clause duration (currently 12 months)",
    "Request clarification on overtime compensation policy",
    "Review the intellectual property clause scope for personal projects",
    "Ensure termination notice requirements are mutual (currently favors employer)",
];

pub fn important_clauses() -> Vec<ImportantClause> {
    vec![
        ImportantClause {
            clause: "Employee agrees not to engage in any business competitive with Company for a \
                     period of twelve (12) months following termination of employment."
                .to_string(),
            explanation: "This prevents you from working for competitors or starting a competing \
                          business for one year after leaving. Consider if this timeframe is \
                          reasonable for your industry and career goals."
                .to_string(),
            importance: Importance::High,
        },
        ImportantClause {
            clause: "All inventions, discoveries, and improvements made during employment shall \
                     be the sole property of Company."
                .to_string(),
            explanation: "Any creative work or innovations you develop while employed belong to \
                          the company, even if created outside work hours. This may affect \
                          personal projects."
                .to_string(),
            importance: Importance::Medium,
        },
        ImportantClause {
            clause: "Employment may be terminated by either party with two (2) weeks written \
                     notice, except Company may terminate immediately for cause."
                .to_string(),
            explanation: "While you must give two weeks notice, the company can fire you \
                          immediately for misconduct. This creates an imbalance in termination \
                          procedures."
                .to_string(),
            importance: Importance::Medium,
        },
    ]
}

pub fn analysis_steps() -> Vec<StepDefinition> {
    vec![
        StepDefinition::new(
            "1",
            "Document Processing",
            "Extracting text and analyzing document structure",
        ),
        StepDefinition::new(
            "2",
            "Legal Term Identification",
            "Identifying legal terminology and key clauses",
        ),
        StepDefinition::new(
            "3",
            "Risk Assessment",
            "Evaluating potential risks and obligations",
        ),
        StepDefinition::new(
            "4",
            "Plain Language Translation",
            "Converting complex legal language to plain English",
        ),
        StepDefinition::new(
            "5",
            "Generating Recommendations",
            "Providing actionable insights and suggestions",
        ),
    ]
}
