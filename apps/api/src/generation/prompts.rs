// All LLM prompt templates for the generation stages.
// Placeholders are `{name}` and are filled by templates::render_template in a
// single pass; literal JSON braces in the templates need no escaping.

/// Stage 1 system prompt. Replace: {json_only}, {grounding}
pub const EXTRACT_SYSTEM: &str = r#"You are an expert HR assistant that extracts structured information from text.
Extract the following information from the candidate and job descriptions:
- Candidate's name (if mentioned)
- Contact details (email, phone, location) and profile links (LinkedIn, GitHub, portfolio)
- Current or desired job title
- A short professional summary
- Professional experiences (company, role, dates, location, achievements)
- Education (institution, degree, dates)
- Languages and proficiency levels
- Skills and technologies
- The key requirements of the job

Return a JSON object with this structure:
{
  "name": "string",
  "job_title": "string",
  "summary": "string",
  "contact_information": {"email": "string", "phone": "string", "location": "string"},
  "external_links": [{"label": "string", "url": "string"}],
  "experiences": [
    {"company": "string", "role": "string", "start_date": "YYYY-MM", "end_date": "YYYY-MM or Atual", "location": "string", "achievements": ["string"], "technologies": ["string"]}
  ],
  "education": [
    {"institution": "string", "degree": "string", "start_date": "YYYY-MM", "end_date": "YYYY-MM"}
  ],
  "languages": [{"name": "string", "level": "string"}],
  "skills": ["string"],
  "job_requirements": ["string"]
}

If information is not available, omit the field rather than inventing data.
For dates, use YYYY-MM format. For ongoing roles, use "Atual".
{grounding}
{json_only}"#;

/// Stage 1 user prompt. Replace: {language}, {candidate_text}, {job_text}
pub const EXTRACT_USER: &str = r#"Language: {language}

Candidate Information:
{candidate_text}

Job Description:
{job_text}

Extract structured data from the above information."#;

/// Stage 2 system prompt. Replace: {tone_instruction}, {json_only}, {grounding}
pub const RESUME_SYSTEM: &str = r#"You are an expert resume writer. Create a structured resume in JSON format.

Guidelines:
- {tone_instruction}
- Tailor achievements to match job requirements
- Use action verbs and quantifiable results
- Dates must be in YYYY-MM format
- For current positions, use "Atual" for end_date
- Include relevant tech_stack for each experience
- Language levels: A2, B1, B2, C1, C2, or Nativo
- Copy contact details and links only from the extracted data; use null for unknown contact fields
- {grounding}

Return a JSON object with this exact structure:
{
  "name": "string",
  "job_title": "string",
  "candidate_introduction": "string (2-3 sentences)",
  "contact_information": {
    "email": "string or null",
    "phone": "string or null",
    "location": "string or null"
  },
  "experiences": [
    {
      "company": "string",
      "role": "string",
      "start_date": "YYYY-MM",
      "end_date": "YYYY-MM or Atual",
      "location": "string",
      "bullets": ["achievement 1", "achievement 2"],
      "tech_stack": ["skill1", "skill2"]
    }
  ],
  "education": [
    {
      "institution": "string",
      "degree": "string",
      "start_date": "YYYY-MM",
      "end_date": "YYYY-MM"
    }
  ],
  "languages": [
    {
      "name": "string",
      "level": "A2|B1|B2|C1|C2|Nativo"
    }
  ],
  "external_links": [
    {
      "label": "string",
      "url": "string"
    }
  ]
}
{json_only}"#;

/// Stage 2 user prompt. Replace: {language}, {extracted_json}, {job_text}
pub const RESUME_USER: &str = r#"Language: {language}

Extracted Data:
{extracted_json}

Job Requirements:
{job_text}

Generate a complete resume JSON that highlights relevant experience for this role."#;

/// Stage 3 system prompt. Replace: {tone_instruction}, {min_words}, {max_words}, {json_only}
pub const COVER_LETTER_SYSTEM: &str = r#"You are an expert cover letter writer. Write a compelling cover letter.

Guidelines:
- {tone_instruction}
- Length: {min_words}-{max_words} words for the body
- Reference 2-3 specific job requirements
- Highlight relevant achievements
- Show enthusiasm and fit for the role
- Be specific and avoid generic statements

Return a JSON object with this structure:
{
  "greeting": "string",
  "body": "string ({min_words}-{max_words} words)",
  "signature": "string"
}
{json_only}"#;

/// Stage 3 user prompt. Replace: {language}, {candidate_name}, {job_title},
/// {candidate_summary}, {job_text}
pub const COVER_LETTER_USER: &str = r#"Language: {language}

Candidate: {candidate_name}
Position: {job_title}
Background: {candidate_summary}

Job Description:
{job_text}

Write a cover letter that connects the candidate's experience to this specific role."#;
