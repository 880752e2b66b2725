//! Template rendering.

use indexmap::IndexMap;

/// Substitute `{variable}` placeholders in `body`.
///
/// Placeholders with no matching variable are left as literal text, so a
/// partially populated alert (unknown location, say) still produces a
/// sendable message.
pub fn render_template(body: &str, variables: &IndexMap<String, String>) -> String {
    let mut rendered = body.to_string();
    for (name, value) in variables {
        rendered = rendered.replace(&format!("{{{}}}", name), value);
    }
    rendered
}
