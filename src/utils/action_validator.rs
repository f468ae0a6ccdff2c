//! Checking actions against an action space before they are executed.

use crate::core::{GymError, Result};
use crate::spaces::{DynSpace, Space, Value};

/// `Ok` when `action` belongs to `space`, otherwise `InvalidAction` describing both.
pub fn validate_action(space: &DynSpace, action: &Value) -> Result<()> {
    if space.contains(action) {
        return Ok(());
    }
    let expected = space.dtype().map_or_else(|| "mixed".to_string(), |d| d.to_string());
    Err(GymError::InvalidAction(format!(
        "you passed the action `{action}` of kind {} while the supported action space is {space} \
         with dtype {expected}",
        action.kind()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spaces::{BoxSpace, Discrete};

    #[test]
    fn accepts_contained_actions() {
        let space: DynSpace = BoxSpace::uniform(-1.0, 1.0, &[2]).into();
        assert!(validate_action(&space, &Value::f32s(&[0.5, -0.5])).is_ok());
    }

    #[test]
    fn message_names_value_and_space() {
        let space: DynSpace = Discrete::new(3).into();
        let Err(GymError::InvalidAction(msg)) = validate_action(&space, &Value::f32s(&[1.0])) else {
            panic!("expected InvalidAction");
        };
        assert!(msg.contains("ndarray[float32]"));
        assert!(msg.contains("Discrete(3)"));
        assert!(msg.contains("int64"));
    }
}
