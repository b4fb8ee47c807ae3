//! Static shape descriptions of the records the model is asked to produce.
//! The sanitizer walks these; the validator enforces the same field names.

use crate::models::resume::LanguageLevel;

pub const MAX_NAME_LENGTH: usize = 120;
pub const MAX_JOB_TITLE_LENGTH: usize = 120;
pub const MAX_INTRO_LENGTH: usize = 1200;
pub const MAX_BULLET_LENGTH: usize = 320;
pub const MAX_TECH_ITEM_LENGTH: usize = 60;
pub const MAX_LOCATION_LENGTH: usize = 120;
pub const MAX_EDU_FIELD_LENGTH: usize = 160;
pub const MAX_LANGUAGE_NAME_LENGTH: usize = 60;
pub const MAX_LETTER_LINE_LENGTH: usize = 200;
pub const MAX_LETTER_BODY_LENGTH: usize = 4000;
pub const MAX_CONTACT_FIELD_LENGTH: usize = 120;
pub const MAX_LINK_LABEL_LENGTH: usize = 80;
pub const MAX_LINK_URL_LENGTH: usize = 220;

#[derive(Debug, Clone, Copy)]
pub enum FieldShape {
    /// Free text, cleaned and capped at `max_len` characters.
    Text { max_len: usize },
    /// `YYYY-MM` (or `Atual`); trimmed only.
    Date,
    Enum { allowed: &'static [&'static str] },
    TextList {
        required: bool,
        max_len: usize,
        dedup: bool,
    },
    /// Optional nested object; `null` when every field is blank.
    Object { item: &'static SchemaHints },
    /// With `complete_only`, items missing any hinted field are dropped
    /// instead of being left for the validator.
    ObjectList {
        required: bool,
        item: &'static SchemaHints,
        complete_only: bool,
    },
}

#[derive(Debug, Clone, Copy)]
pub struct FieldHint {
    pub name: &'static str,
    pub shape: FieldShape,
}

#[derive(Debug)]
pub struct SchemaHints {
    pub name: &'static str,
    pub fields: &'static [FieldHint],
}

impl SchemaHints {
    pub fn field(&self, name: &str) -> Option<&FieldHint> {
        self.fields.iter().find(|f| f.name == name)
    }
}

const fn text(name: &'static str, max_len: usize) -> FieldHint {
    FieldHint {
        name,
        shape: FieldShape::Text { max_len },
    }
}

const fn date(name: &'static str) -> FieldHint {
    FieldHint {
        name,
        shape: FieldShape::Date,
    }
}

pub static EXPERIENCE_HINTS: SchemaHints = SchemaHints {
    name: "Experience",
    fields: &[
        text("company", MAX_NAME_LENGTH),
        text("role", MAX_JOB_TITLE_LENGTH),
        date("start_date"),
        date("end_date"),
        text("location", MAX_LOCATION_LENGTH),
        FieldHint {
            name: "bullets",
            shape: FieldShape::TextList {
                required: true,
                max_len: MAX_BULLET_LENGTH,
                dedup: false,
            },
        },
        FieldHint {
            name: "tech_stack",
            shape: FieldShape::TextList {
                required: false,
                max_len: MAX_TECH_ITEM_LENGTH,
                dedup: true,
            },
        },
    ],
};

pub static EDUCATION_HINTS: SchemaHints = SchemaHints {
    name: "Education",
    fields: &[
        text("institution", MAX_EDU_FIELD_LENGTH),
        text("degree", MAX_EDU_FIELD_LENGTH),
        date("start_date"),
        date("end_date"),
    ],
};

pub static LANGUAGE_HINTS: SchemaHints = SchemaHints {
    name: "LanguageProficiency",
    fields: &[
        text("name", MAX_LANGUAGE_NAME_LENGTH),
        FieldHint {
            name: "level",
            shape: FieldShape::Enum {
                allowed: LanguageLevel::NAMES,
            },
        },
    ],
};

pub static CONTACT_HINTS: SchemaHints = SchemaHints {
    name: "ContactInformation",
    fields: &[
        text("email", MAX_CONTACT_FIELD_LENGTH),
        text("phone", MAX_CONTACT_FIELD_LENGTH),
        text("location", MAX_CONTACT_FIELD_LENGTH),
    ],
};

pub static LINK_HINTS: SchemaHints = SchemaHints {
    name: "ExternalLink",
    fields: &[
        text("label", MAX_LINK_LABEL_LENGTH),
        text("url", MAX_LINK_URL_LENGTH),
    ],
};

pub static RESUME_HINTS: SchemaHints = SchemaHints {
    name: "ResumeResponse",
    fields: &[
        text("name", MAX_NAME_LENGTH),
        text("job_title", MAX_JOB_TITLE_LENGTH),
        text("candidate_introduction", MAX_INTRO_LENGTH),
        FieldHint {
            name: "contact_information",
            shape: FieldShape::Object {
                item: &CONTACT_HINTS,
            },
        },
        FieldHint {
            name: "experiences",
            shape: FieldShape::ObjectList {
                required: true,
                item: &EXPERIENCE_HINTS,
                complete_only: false,
            },
        },
        FieldHint {
            name: "education",
            shape: FieldShape::ObjectList {
                required: false,
                item: &EDUCATION_HINTS,
                complete_only: false,
            },
        },
        FieldHint {
            name: "languages",
            shape: FieldShape::ObjectList {
                required: false,
                item: &LANGUAGE_HINTS,
                complete_only: false,
            },
        },
        FieldHint {
            name: "external_links",
            shape: FieldShape::ObjectList {
                required: false,
                item: &LINK_HINTS,
                complete_only: true,
            },
        },
    ],
};

pub static COVER_LETTER_HINTS: SchemaHints = SchemaHints {
    name: "CoverLetterResponse",
    fields: &[
        text("greeting", MAX_LETTER_LINE_LENGTH),
        text("body", MAX_LETTER_BODY_LENGTH),
        text("signature", MAX_LETTER_LINE_LENGTH),
    ],
};
