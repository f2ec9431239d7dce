// Resume analysis prompt templates.

pub const MATCH_PROMPT_TEMPLATE: &str = r#"Analyze this RESUME against the JOB DETAILS. {json_only}

JOB TITLE: {title}
REQUIRED SKILLS: {required_skills}
EXPERIENCE REQUIRED: {experience_years} years

RESUME TEXT:
{resume_text}

Return JSON with this exact schema:
{
  "match_score": <number 0-100>,
  "recommendation": "<Strong Match|Good Match|Moderate Match|Weak Match>",
  "key_strengths": ["strength1", "strength2"],
  "missing_skills": ["skill1", "skill2"],
  "skills_found": ["skill1", "skill2"],
  "experience_summary": "brief summary",
  "education": "education details",
  "estimated_experience_years": <number>,
  "reasoning": "explanation of the match score"
}"#;
