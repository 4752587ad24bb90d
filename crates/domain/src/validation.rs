use serde::{Deserialize, Serialize};

use crate::models::{ExternalOrigin, MAX_RATING, MIN_RATING};

pub const TEXT_MIN_CHARS: usize = 10;
pub const TEXT_MAX_CHARS: usize = 5000;
pub const NAME_MIN_CHARS: usize = 2;
pub const NAME_MAX_CHARS: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// 访客提交或导入器生成的待校验评价
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewInput {
    pub rating: Option<i64>,
    pub review: Option<String>,
    pub contact_details: Option<String>,
    pub user_name: Option<String>,
    pub element_id: Option<i64>,
    pub offer_id: Option<i64>,
    /// 为兼容旧表单而接收，但不会生效
    pub active: Option<bool>,
    #[serde(skip)]
    pub user_id: Option<i64>,
    #[serde(skip)]
    pub origin: Option<ExternalOrigin>,
}

/// 通过全部字段校验的输入，评分保证在 1..=5
#[derive(Debug, Clone, PartialEq)]
pub struct ValidReview {
    pub rating: i64,
    pub text: String,
    pub contact_details: Option<String>,
    pub user_name: Option<String>,
    pub product_id: i64,
    pub offer_id: Option<i64>,
    pub user_id: Option<i64>,
    pub origin: Option<ExternalOrigin>,
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl ReviewInput {
    /// 超出范围的评分直接拒绝，不做截断
    pub fn validate(&self) -> Result<ValidReview, Vec<FieldError>> {
        let mut errors = Vec::new();

        match self.rating {
            None => errors.push(FieldError::new("rating", "Rating is required")),
            Some(r) if r < MIN_RATING => errors.push(FieldError::new(
                "rating",
                format!("Minimum rating is {}", MIN_RATING),
            )),
            Some(r) if r > MAX_RATING => errors.push(FieldError::new(
                "rating",
                format!("Maximum rating is {}", MAX_RATING),
            )),
            Some(_) => {}
        }

        let text = non_blank(&self.review);
        match text {
            None => errors.push(FieldError::new("review", "Review text is required")),
            Some(t) => {
                let len = t.chars().count();
                if !(TEXT_MIN_CHARS..=TEXT_MAX_CHARS).contains(&len) {
                    errors.push(FieldError::new(
                        "review",
                        format!(
                            "Review must be between {} and {} characters",
                            TEXT_MIN_CHARS, TEXT_MAX_CHARS
                        ),
                    ));
                }
            }
        }

        let user_name = non_blank(&self.user_name);
        if let Some(name) = user_name {
            let len = name.chars().count();
            if !(NAME_MIN_CHARS..=NAME_MAX_CHARS).contains(&len) {
                errors.push(FieldError::new(
                    "userName",
                    format!(
                        "Name must be between {} and {} characters",
                        NAME_MIN_CHARS, NAME_MAX_CHARS
                    ),
                ));
            }
        }

        let product_id = match self.element_id {
            Some(id) if id > 0 => Some(id),
            _ => {
                errors.push(FieldError::new("elementId", "Element ID is required"));
                None
            }
        };

        if !errors.is_empty() {
            return Err(errors);
        }

        match (self.rating, text, product_id) {
            (Some(rating), Some(text), Some(product_id)) => Ok(ValidReview {
                rating,
                text: text.to_string(),
                contact_details: non_blank(&self.contact_details).map(str::to_string),
                user_name: user_name.map(str::to_string),
                product_id,
                offer_id: self.offer_id.filter(|id| *id > 0),
                user_id: self.user_id,
                origin: self.origin.clone(),
            }),
            _ => Err(vec![FieldError::new("form", "Incomplete review")]),
        }
    }
}

/// 创建结果：要么是新 id，要么是字段错误
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateResult {
    Created { review_id: i64 },
    Rejected { errors: Vec<FieldError> },
}

impl CreateResult {
    pub fn is_success(&self) -> bool {
        matches!(self, CreateResult::Created { .. })
    }

    pub fn review_id(&self) -> Option<i64> {
        match self {
            CreateResult::Created { review_id } => Some(*review_id),
            CreateResult::Rejected { .. } => None,
        }
    }
}

#[derive(Serialize)]
struct CreatedData {
    #[serde(rename = "reviewId")]
    review_id: i64,
}

#[derive(Serialize)]
struct CreateResultWire<'a> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<CreatedData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<&'a [FieldError]>,
}

impl Serialize for CreateResult {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let wire = match self {
            CreateResult::Created { review_id } => CreateResultWire {
                success: true,
                data: Some(CreatedData {
                    review_id: *review_id,
                }),
                errors: None,
            },
            CreateResult::Rejected { errors } => CreateResultWire {
                success: false,
                data: None,
                errors: Some(errors),
            },
        };
        wire.serialize(serializer)
    }
}
