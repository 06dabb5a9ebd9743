use serde::Serialize;
use utoipa::ToSchema;

const NAME_HEADERS: [&str; 3] = ["name", "full name", "contact name"];
const EMAIL_HEADERS: [&str; 3] = ["email", "e-mail", "mail"];
const PHONE_KEYWORDS: [&str; 3] = ["phone", "tel", "mobile"];
const COMPANY_KEYWORDS: [&str; 3] = ["company", "organization", "business"];

/// Column index for each customer field found in the header row
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct FieldMapping {
    pub name: Option<usize>,
    pub email: Option<usize>,
    pub phone: Option<usize>,
    pub company: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CustomerField {
    Name,
    Email,
    Phone,
    Company,
}

fn classify(header: &str) -> Option<CustomerField> {
    let header = header.trim().to_lowercase();
    let contains_any = |keywords: &[&str]| keywords.iter().any(|k| header.contains(k));

    if NAME_HEADERS.contains(&header.as_str()) {
        Some(CustomerField::Name)
    } else if EMAIL_HEADERS.contains(&header.as_str()) || header.contains("email") {
        Some(CustomerField::Email)
    } else if contains_any(&PHONE_KEYWORDS) {
        Some(CustomerField::Phone)
    } else if contains_any(&COMPANY_KEYWORDS) {
        Some(CustomerField::Company)
    } else {
        None
    }
}

/// Map headers to customer fields. Each header lands in the first category it
/// matches and the first header of a category wins that field.
pub fn auto_map_fields<S: AsRef<str>>(headers: &[S]) -> FieldMapping {
    let mut mapping = FieldMapping::default();

    for (index, header) in headers.iter().enumerate() {
        let slot = match classify(header.as_ref()) {
            Some(CustomerField::Name) => &mut mapping.name,
            Some(CustomerField::Email) => &mut mapping.email,
            Some(CustomerField::Phone) => &mut mapping.phone,
            Some(CustomerField::Company) => &mut mapping.company,
            None => continue,
        };
        slot.get_or_insert(index);
    }

    mapping
}
