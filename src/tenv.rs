//! # Type Environment
//!
//! Immutable, chainable mapping from variable names to type expressions.
//! Extension pushes a whole frame of bindings at once and returns a new
//! environment sharing the older frames; nothing is ever mutated in place,
//! so `letrec` and nested `let`/procedure bodies can safely share outer
//! frames while only the innermost frame differs.

use crate::texp::TExp;
use crate::type_checker::TypeError;
use std::rc::Rc;

/// A persistent chain of binding frames. Lookup walks from the most recent
/// frame outward, so later extensions shadow earlier ones.
#[derive(Debug, Clone, Default)]
pub struct TEnv {
    frame: Option<Rc<Frame>>,
}

#[derive(Debug)]
struct Frame {
    bindings: Vec<(String, TExp)>,
    next: Option<Rc<Frame>>,
}

impl TEnv {
    /// Creates an empty environment.
    pub fn empty() -> Self {
        TEnv { frame: None }
    }

    /// Returns a new environment with one extra frame of bindings.
    pub fn extend(&self, names: &[String], texps: &[TExp]) -> TEnv {
        debug_assert_eq!(names.len(), texps.len());
        let bindings = names
            .iter()
            .cloned()
            .zip(texps.iter().cloned())
            .collect();
        TEnv {
            frame: Some(Rc::new(Frame {
                bindings,
                next: self.frame.clone(),
            })),
        }
    }

    /// Looks up a variable, innermost frame first.
    pub fn lookup(&self, name: &str) -> Result<TExp, TypeError> {
        let mut frame = self.frame.as_deref();
        while let Some(f) = frame {
            // Within a frame, the most recently pushed binding wins.
            if let Some((_, texp)) = f.bindings.iter().rev().find(|(n, _)| n == name) {
                return Ok(texp.clone());
            }
            frame = f.next.as_deref();
        }
        Err(TypeError::UnboundVariable(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_lookup_fails() {
        let tenv = TEnv::empty();
        assert_eq!(
            tenv.lookup("x"),
            Err(TypeError::UnboundVariable("x".to_string()))
        );
    }

    #[test]
    fn test_extend_and_lookup() {
        let tenv = TEnv::empty().extend(&["x".to_string()], &[TExp::Num]);
        assert_eq!(tenv.lookup("x"), Ok(TExp::Num));
    }

    #[test]
    fn test_inner_frame_shadows_outer() {
        let outer = TEnv::empty().extend(&["x".to_string()], &[TExp::Num]);
        let inner = outer.extend(&["x".to_string()], &[TExp::Bool]);
        assert_eq!(inner.lookup("x"), Ok(TExp::Bool));
        // The outer environment is untouched.
        assert_eq!(outer.lookup("x"), Ok(TExp::Num));
    }

    #[test]
    fn test_lookup_walks_all_frames() {
        let tenv = TEnv::empty()
            .extend(&["x".to_string()], &[TExp::Num])
            .extend(&["y".to_string()], &[TExp::Bool]);
        assert_eq!(tenv.lookup("x"), Ok(TExp::Num));
        assert_eq!(tenv.lookup("y"), Ok(TExp::Bool));
        assert!(tenv.lookup("z").is_err());
    }

    #[test]
    fn test_batch_extension_is_one_frame() {
        let tenv = TEnv::empty().extend(
            &["a".to_string(), "b".to_string()],
            &[TExp::Num, TExp::Str],
        );
        assert_eq!(tenv.lookup("a"), Ok(TExp::Num));
        assert_eq!(tenv.lookup("b"), Ok(TExp::Str));
    }
}
