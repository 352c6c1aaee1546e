use std::collections::HashMap;

/// Static pricing-category id → display name table.
#[derive(Debug, Clone, Default)]
pub struct CategoryNames {
    names: HashMap<i64, String>,
}

impl CategoryNames {
    pub fn new(names: HashMap<i64, String>) -> Self {
        Self { names }
    }

    /// Builds the table from configuration, where keys are strings. Non-numeric keys are skipped.
    pub fn from_config(raw: &HashMap<String, String>) -> Self {
        let names = raw
            .iter()
            .filter_map(|(k, v)| match k.trim().parse::<i64>() {
                Ok(id) => Some((id, v.clone())),
                Err(_) => {
                    tracing::warn!(key = %k, "ignoring non-numeric pricing category id");
                    None
                }
            })
            .collect();
        Self { names }
    }

    pub fn label(&self, category_id: i64) -> String {
        self.names
            .get(&category_id)
            .cloned()
            .unwrap_or_else(|| format!("Category {}", category_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_ids_get_generic_label() {
        let mut raw = HashMap::new();
        raw.insert("101".to_string(), "Adult".to_string());
        raw.insert("kids".to_string(), "Child".to_string());
        let names = CategoryNames::from_config(&raw);

        assert_eq!(names.label(101), "Adult");
        assert_eq!(names.label(202), "Category 202");
    }
}
