mod status;

/// Namespace for small reusable widgets.
pub struct UiComponent;
