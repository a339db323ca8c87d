//! Indented tree rendering

use era7_core::message::Message;

/// Options for [`render`]
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Truncate displayed values beyond this many characters
    pub max_value_length: Option<usize>,
    /// Skip fields whose raw text is empty
    pub skip_empty_fields: bool,
    pub indent: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            max_value_length: Some(60),
            skip_empty_fields: true,
            indent: "  ".to_string(),
        }
    }
}

fn clip(value: &str, options: &RenderOptions) -> String {
    match options.max_value_length {
        Some(max) if value.chars().count() > max => {
            let clipped: String = value.chars().take(max).collect();
            format!("{}…", clipped)
        }
        _ => value.to_string(),
    }
}

/// Render a message as an indented tree
///
/// One line per segment, field, and (where present) component, so the
/// structure is visible at a glance:
///
/// ```text
/// PID
///   PID-3: 12345^^^MRN
///     .1: 12345
///     .4: MRN
/// ```
pub fn render(message: &Message, options: &RenderOptions) -> String {
    let mut out = String::new();
    let i1 = &options.indent;
    let i2 = options.indent.repeat(2);

    for segment in message.segments() {
        out.push_str(segment.id());
        out.push('\n');

        for (index, field) in segment.fields().iter().enumerate() {
            let number = index + 1;
            if options.skip_empty_fields && field.is_empty() {
                continue;
            }
            out.push_str(&format!(
                "{}{}-{}: {}\n",
                i1,
                segment.id(),
                number,
                clip(field.raw(), options)
            ));

            // Expand multi-part fields one level further
            let rep = field.repetition(0);
            if field.repetition_count() == 1 && rep.component_count() > 1 {
                for (ci, component) in rep.components().iter().enumerate() {
                    if component.is_empty() {
                        continue;
                    }
                    out.push_str(&format!(
                        "{}.{}: {}\n",
                        i2,
                        ci + 1,
                        clip(&component.encode(message.delimiters()), options)
                    ));
                }
            } else if field.repetition_count() > 1 {
                for (ri, repetition) in field.repetitions().iter().enumerate() {
                    out.push_str(&format!(
                        "{}[{}]: {}\n",
                        i2,
                        ri + 1,
                        clip(&repetition.encode(message.delimiters()), options)
                    ));
                }
            }
        }
    }

    out
}
