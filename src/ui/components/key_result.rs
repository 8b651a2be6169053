/// Generic result type for component key handling.
///
/// Components return this to their view so the view can either stop (the
/// key was consumed), react to an event, or try its own bindings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyResult<T> {
  /// Key was consumed, no event for parent to handle
  Handled,
  /// Key was consumed, here's an event for parent to process
  Event(T),
  /// Key was not consumed, parent should try next handler
  NotHandled,
}
