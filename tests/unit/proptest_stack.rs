//! Property-based tests for the stack and templates
//!
//! Uses proptest to verify properties that should hold for all inputs.

use std::collections::HashMap;

use includer::stack::Stack;
use includer::template::{Template, UnixShellTemplate, WindowsCmdTemplate};
use proptest::prelude::*;

proptest! {
    /// pop_all returns the pushed elements reversed
    #[test]
    fn pop_all_reverses_push_order(items in proptest::collection::vec(any::<i32>(), 0..50)) {
        let mut stack = Stack::new();
        stack.push_all(items.clone());
        let mut expected = items;
        expected.reverse();
        prop_assert_eq!(stack.pop_all(), expected);
        prop_assert!(stack.is_empty());
    }

    /// Popping everything one at a time matches pop_all
    #[test]
    fn pop_sequence_matches_to_vec(items in proptest::collection::vec(any::<u8>(), 0..50)) {
        let mut stack: Stack<u8> = items.into_iter().collect();
        let snapshot = stack.to_vec();
        let mut popped = Vec::new();
        while let Some(x) = stack.pop() {
            popped.push(x);
        }
        prop_assert_eq!(popped, snapshot);
    }

    /// Text with no markers passes through the Unix template unchanged
    #[test]
    fn unix_plain_text_unchanged(text in "[A-Za-z0-9 .,:;!?-]*") {
        let t = UnixShellTemplate::new(HashMap::<String, String>::new());
        prop_assert_eq!(t.substitute(&text).unwrap(), text);
    }

    /// Text with no markers passes through the Windows template unchanged
    #[test]
    fn windows_plain_text_unchanged(text in "[A-Za-z0-9 .,:;!?-]*") {
        let t = WindowsCmdTemplate::new(HashMap::<String, String>::new());
        prop_assert_eq!(t.substitute(&text).unwrap(), text);
    }

    /// A known variable is always replaced by its value
    #[test]
    fn known_variable_is_substituted(name in "[a-z_]{1,8}", value in "[a-z ]{0,10}") {
        let vars = HashMap::from([(name.clone(), value.clone())]);
        let t = UnixShellTemplate::new(vars);
        prop_assert_eq!(t.substitute(&format!("<${{{name}}}>")).unwrap(), format!("<{value}>"));
    }
}
