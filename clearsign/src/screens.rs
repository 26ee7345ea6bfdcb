//! Screen pagination.
//!
//! Groups resolved fields into the fixed four-row pages a signing
//! device steps through.

use crate::fields::{ResolvedField, UNDEFINED};

/// Rows a device screen fits.
pub const ROWS_PER_SCREEN: usize = 4;

/// Split resolved fields into screens of four rows.
///
/// Unlabeled fields are not displayable and are dropped first. A
/// separator row still consumes a slot and renders blank; any other
/// field that somehow arrived with an empty value renders the
/// `"[undefined]"` guard instead of a hole. Zero displayable fields
/// yields zero screens, never an empty screen.
pub fn paginate(fields: &[ResolvedField]) -> Vec<Vec<ResolvedField>> {
    let displayable: Vec<ResolvedField> = fields
        .iter()
        .filter(|f| f.label().is_some())
        .map(|f| {
            if !f.is_separator() && f.display_value.is_empty() {
                let mut guarded = f.clone();
                guarded.display_value = UNDEFINED.to_string();
                guarded
            } else {
                f.clone()
            }
        })
        .collect();

    displayable
        .chunks(ROWS_PER_SCREEN)
        .map(<[ResolvedField]>::to_vec)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::erc7730::Field;
    use pretty_assertions::assert_eq;

    fn field(label: Option<&str>, path: Option<&str>, value: &str) -> ResolvedField {
        ResolvedField {
            field: Field {
                label: label.map(str::to_string),
                path: path.map(str::to_string),
                ..Default::default()
            },
            display_value: value.to_string(),
        }
    }

    #[test]
    fn test_chunks_of_four_with_short_tail() {
        let fields: Vec<ResolvedField> = (0..9)
            .map(|i| field(Some(format!("Row {i}").as_str()), Some("#.x"), "v"))
            .collect();
        let screens = paginate(&fields);
        let sizes: Vec<usize> = screens.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![4, 4, 1]);
    }

    #[test]
    fn test_unlabeled_fields_are_dropped_before_chunking() {
        let fields = vec![
            field(Some("A"), Some("#.a"), "1"),
            field(None, Some("#.b"), "2"),
            field(Some(""), Some("#.c"), "3"),
            field(Some("D"), Some("#.d"), "4"),
        ];
        let screens = paginate(&fields);
        assert_eq!(screens.len(), 1);
        let labels: Vec<&str> = screens[0].iter().filter_map(ResolvedField::label).collect();
        assert_eq!(labels, vec!["A", "D"]);
    }

    #[test]
    fn test_separator_consumes_a_slot_and_stays_blank() {
        let fields = vec![
            field(Some("A"), Some("#.a"), "1"),
            field(Some(" "), Some("separator"), ""),
            field(Some("B"), Some("#.b"), "2"),
        ];
        let screens = paginate(&fields);
        assert_eq!(screens[0].len(), 3);
        assert_eq!(screens[0][1].display_value, "");
    }

    #[test]
    fn test_empty_non_separator_value_gets_guard_text() {
        let fields = vec![field(Some("Ghost"), Some("#.x"), "")];
        let screens = paginate(&fields);
        assert_eq!(screens[0][0].display_value, UNDEFINED);
    }

    #[test]
    fn test_no_displayable_fields_yields_no_screens() {
        assert_eq!(paginate(&[]), Vec::<Vec<ResolvedField>>::new());
        assert_eq!(
            paginate(&[field(None, Some("#.x"), "v")]),
            Vec::<Vec<ResolvedField>>::new()
        );
    }
}
