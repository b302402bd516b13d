//! System instruction for the product-description model.
//!
//! Centralising the prompt here keeps it out of the retry and error-handling
//! code in [`crate::pipeline::llm`], and lets tests inspect it without a model.
//!
//! The instruction is always Spanish and never carries per-request data: the
//! photo travels as a separate image attachment. It is rendered once and
//! shared through [`SYSTEM_INSTRUCTION`].

use crate::schema::{Condition, REQUIRED_KEYS};
use once_cell::sync::Lazy;
use serde_json::{json, Value};

/// Instruction body. `{format_instructions}` is replaced by
/// [`format_instructions`] when rendering.
pub const INSTRUCTION_TEMPLATE: &str = r#"Eres un sistema que analiza fotografías de productos de segunda mano.
Debes indicar, en español, las siguientes características del producto:
- condition: estado del producto. Valores posibles: {conditions}
- brand: marca del producto
- model: modelo del producto
- damage: si el producto tiene daños o marcas de uso, descríbelos; si no tiene, deja el texto vacío
- title: título breve del anuncio, que incluya marca y modelo
- description: descripción del anuncio pensada para atraer compradores
- in_focus: la foto está enfocada. true o false.
- finger_obstruction: la foto contiene un dedo que tapa parte del producto. true o false.
{format_instructions}"#;

/// Rendered instruction, built on first use and reused for every request.
pub static SYSTEM_INSTRUCTION: Lazy<String> = Lazy::new(render_instruction);

/// Render the full system instruction.
///
/// Pure and deterministic: two calls always return identical strings.
pub fn render_instruction() -> String {
    let conditions = Condition::ALL
        .iter()
        .map(|c| c.label())
        .collect::<Vec<_>>()
        .join(", ");

    INSTRUCTION_TEMPLATE
        .replace("{conditions}", &conditions)
        .replace("{format_instructions}", &format_instructions())
}

/// Output-format directive with an embedded JSON schema of the record.
pub fn format_instructions() -> String {
    format!(
        "La salida debe ser un único objeto JSON plano que cumpla el siguiente esquema JSON.\n\n\
Por ejemplo, para el esquema {{\"properties\": {{\"foo\": {{\"title\": \"Foo\", \"description\": \"una lista de cadenas\", \"type\": \"array\", \"items\": {{\"type\": \"string\"}}}}}}, \"required\": [\"foo\"]}}\n\
el objeto {{\"foo\": [\"bar\", \"baz\"]}} es una instancia válida del esquema. \
El objeto {{\"properties\": {{\"foo\": [\"bar\", \"baz\"]}}}} no es válido.\n\n\
Este es el esquema de salida:\n```\n{}\n```\n\
Responde únicamente con el objeto JSON, sin texto adicional.",
        output_schema()
    )
}

/// JSON schema describing [`crate::schema::ProductRecord`].
pub fn output_schema() -> Value {
    let conditions: Vec<&str> = Condition::ALL.iter().map(|c| c.label()).collect();
    let properties = json!({
        "condition": {
            "title": "Condition",
            "description": "Estado del producto",
            "type": "string",
            "enum": conditions
        },
        "brand": {"title": "Brand", "description": "Marca del producto", "type": "string"},
        "model": {"title": "Model", "description": "Modelo del producto", "type": "string"},
        "damage": {
            "title": "Damage",
            "description": "Descripción de los daños o marcas de uso del producto",
            "type": "string"
        },
        "title": {"title": "Title", "description": "Título breve del anuncio", "type": "string"},
        "description": {
            "title": "Description",
            "description": "Descripción del anuncio para atraer clientes",
            "type": "string"
        },
        "in_focus": {"title": "In Focus", "description": "La foto está enfocada", "type": "boolean"},
        "finger_obstruction": {
            "title": "Finger Obstruction",
            "description": "La foto contiene un dedo que impide ver parte del producto",
            "type": "boolean"
        }
    });

    json!({
        "properties": properties,
        "required": REQUIRED_KEYS,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_is_deterministic() {
        assert_eq!(render_instruction(), render_instruction());
        assert_eq!(*SYSTEM_INSTRUCTION, render_instruction());
    }

    #[test]
    fn no_placeholders_left() {
        let s = render_instruction();
        assert!(!s.contains("{format_instructions}"));
        assert!(!s.contains("{conditions}"));
    }

    #[test]
    fn schema_properties_are_exactly_the_required_keys() {
        let schema = output_schema();
        let props = schema["properties"].as_object().expect("properties object");
        let mut keys: Vec<&str> = props.keys().map(String::as_str).collect();
        keys.sort_unstable();
        let mut expected = REQUIRED_KEYS.to_vec();
        expected.sort_unstable();
        assert_eq!(keys, expected);
        assert_eq!(schema["required"].as_array().map(Vec::len), Some(8));
    }

    #[test]
    fn instruction_mentions_every_field_and_condition() {
        let s = render_instruction();
        for key in REQUIRED_KEYS {
            assert!(s.contains(key), "missing field {key}");
        }
        for c in Condition::ALL {
            assert!(s.contains(c.label()), "missing condition {}", c.label());
        }
        assert!(s.starts_with("Eres un sistema"));
    }
}
