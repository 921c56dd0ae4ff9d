// Evaluator prompt templates, one per assessment kind.
// Shared fragments come from llm_client::prompts.

/// System prompt for answer evaluation. Enforces JSON-only output.
pub const EVALUATION_SYSTEM: &str = "You are an experienced assessment-centre assessor. \
    You evaluate a single candidate answer against explicit grading criteria for one competency. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences.";

/// Situational-judgment prompt. Replace every `{placeholder}` before sending.
pub const SJT_EVALUATION_TEMPLATE: &str = r#"Evaluate the candidate's response to a situational-judgment scenario.

SITUATION:
{situation}

QUESTION:
{question}

COMPETENCY BEING ASSESSED: {competency}

BEST RESPONSE CRITERIA:
{best_rationale}

WORST RESPONSE CRITERIA:
{worst_rationale}

CANDIDATE'S ANSWER:
{candidate_answer}

{scoring_scale}

{rationale_instruction}

Return a JSON object with this EXACT schema (no extra fields):
{"score": 7, "rationale": "The candidate ..."}"#;

/// Structured-interview prompt. Replace every `{placeholder}` before sending.
pub const INTERVIEW_EVALUATION_TEMPLATE: &str = r#"Evaluate the candidate's answer to a structured interview question derived from the job description.

ROLE CONTEXT:
{situation}

INTERVIEW QUESTION:
{question}

COMPETENCY BEING ASSESSED: {competency}

WHAT A STRONG ANSWER SHOWS:
{best_rationale}

WHAT A WEAK ANSWER SHOWS:
{worst_rationale}

CANDIDATE'S ANSWER:
{candidate_answer}

{scoring_scale}

{rationale_instruction}

Return a JSON object with this EXACT schema (no extra fields):
{"score": 7, "rationale": "The candidate ..."}"#;

/// Filler for prompt sections the question does not provide.
pub const NOT_PROVIDED: &str = "(not provided)";
