/// What the local user is doing, as far as the inactivity poll cares.
///
/// The poll timer only runs in [`Activity::Idle`]; composing a message or
/// waiting on a reply both hold it off. A draft typed while a reply is
/// outstanding is remembered so the last reply lands back in `Composing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Activity {
    #[default]
    Idle,
    Composing,
    AwaitingReply { pending: usize, composing: bool },
}

impl Activity {
    pub fn is_idle(&self) -> bool {
        matches!(self, Activity::Idle)
    }

    /// The input box changed.
    pub fn on_input(self, text: &str) -> Self {
        let composing = !text.trim().is_empty();
        match self {
            Activity::AwaitingReply { pending, .. } => Activity::AwaitingReply { pending, composing },
            _ if composing => Activity::Composing,
            _ => Activity::Idle,
        }
    }

    /// A send or poll went out.
    pub fn on_request(self) -> Self {
        match self {
            Activity::AwaitingReply { pending, composing } => Activity::AwaitingReply {
                pending: pending + 1,
                composing,
            },
            Activity::Composing => Activity::AwaitingReply {
                pending: 1,
                composing: true,
            },
            Activity::Idle => Activity::AwaitingReply {
                pending: 1,
                composing: false,
            },
        }
    }

    /// A reply (or failure) came back for an outstanding request.
    pub fn on_reply(self) -> Self {
        match self {
            Activity::AwaitingReply { pending, composing } if pending > 1 => {
                Activity::AwaitingReply {
                    pending: pending - 1,
                    composing,
                }
            }
            Activity::AwaitingReply { composing: true, .. } => Activity::Composing,
            Activity::AwaitingReply { .. } => Activity::Idle,
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typing_moves_between_idle_and_composing() {
        let state = Activity::Idle.on_input("hel");
        assert_eq!(state, Activity::Composing);
        assert_eq!(state.on_input("   "), Activity::Idle);
    }

    #[test]
    fn test_input_while_waiting_keeps_request_pending() {
        let state = Activity::Idle.on_request();
        assert_eq!(
            state.on_input("next idea"),
            Activity::AwaitingReply {
                pending: 1,
                composing: true
            }
        );
    }

    #[test]
    fn test_draft_typed_while_waiting_survives_reply() {
        let state = Activity::Composing
            .on_request()
            .on_input("")
            .on_input("half a second thought");
        assert_eq!(state.on_reply(), Activity::Composing);
    }

    #[test]
    fn test_cleared_draft_returns_to_idle_on_reply() {
        let state = Activity::Composing.on_request().on_input("");
        assert_eq!(state.on_reply(), Activity::Idle);
    }

    #[test]
    fn test_overlapping_requests_wait_for_the_last_reply() {
        let state = Activity::Idle.on_request().on_request();
        assert_eq!(
            state,
            Activity::AwaitingReply {
                pending: 2,
                composing: false
            }
        );
        let state = state.on_reply();
        assert!(!state.is_idle());
        assert!(state.on_reply().is_idle());
    }

    #[test]
    fn test_stray_reply_is_ignored() {
        assert_eq!(Activity::Composing.on_reply(), Activity::Composing);
        assert_eq!(Activity::Idle.on_reply(), Activity::Idle);
    }
}
