// Cross-cutting prompt fragments shared by every evaluator prompt.
// Kind-specific templates live in assessment::prompts.

/// Scoring scale every evaluator prompt embeds, so scores are comparable across kinds.
pub const SCORING_SCALE_INSTRUCTION: &str = "\
    Score on a 0-10 scale where 0-2 means the answer matches the worst response, \
    3-4 is weak, 5-6 is adequate, 7-8 is strong and 9-10 matches the best response. \
    Judge only the competency named. Do NOT reward length or confident tone on its own.";

/// Constraints on the rationale text so it renders cleanly in reports.
pub const RATIONALE_INSTRUCTION: &str = "\
    Write the rationale in English as two or three plain sentences of prose. \
    Do NOT use bullet points, headings or markdown. \
    Refer to the person as \"the candidate\".";
