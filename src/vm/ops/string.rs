//! String operations (§4.7).

use crate::value::tagged::Value;
use crate::vm::ops::{pop, pop_i64, pop_string};
use crate::vm::registry::Registry;

pub fn register(registry: &mut Registry) {
    registry.add("string", |s| {
        let v = pop(s)?;
        s.push(Value::String(v.to_string()));
        Ok(())
    });
    registry.add("string?", |s| {
        let is_string = matches!(s.last(), Some(Value::String(_)));
        s.push(Value::Boolean(is_string));
        Ok(())
    });
    registry.add("concat", |s| {
        let b = pop_string(s)?;
        let a = pop_string(s)?;
        s.push(Value::String(a + &b));
        Ok(())
    });
    registry.add("length", |s| {
        let a = pop_string(s)?;
        s.push(Value::Long(a.chars().count() as i64));
        Ok(())
    });
    registry.add("upper", |s| {
        let a = pop_string(s)?;
        s.push(Value::String(a.to_uppercase()));
        Ok(())
    });
    registry.add("lower", |s| {
        let a = pop_string(s)?;
        s.push(Value::String(a.to_lowercase()));
        Ok(())
    });
    registry.add("trim", |s| {
        let a = pop_string(s)?;
        s.push(Value::String(a.trim().to_string()));
        Ok(())
    });
    registry.add("contains", |s| {
        let needle = pop_string(s)?;
        let haystack = pop_string(s)?;
        s.push(Value::Boolean(haystack.contains(&needle)));
        Ok(())
    });
    registry.add("starts_with", |s| {
        let prefix = pop_string(s)?;
        let text = pop_string(s)?;
        s.push(Value::Boolean(text.starts_with(&prefix)));
        Ok(())
    });
    registry.add("ends_with", |s| {
        let suffix = pop_string(s)?;
        let text = pop_string(s)?;
        s.push(Value::Boolean(text.ends_with(&suffix)));
        Ok(())
    });
    registry.add("index_of", |s| {
        let needle = pop_string(s)?;
        let haystack = pop_string(s)?;
        let index = haystack.find(&needle).map(|b| haystack[..b].chars().count() as i64).unwrap_or(-1);
        s.push(Value::Long(index));
        Ok(())
    });
    registry.add("substr", |s| {
        let len = pop_i64(s)?;
        let start = pop_i64(s)?;
        let text = pop_string(s)?;
        let chars: Vec<char> = text.chars().collect();
        let start = start.max(0) as usize;
        let end = (start.saturating_add(len.max(0) as usize)).min(chars.len());
        let start = start.min(chars.len());
        s.push(Value::String(chars[start..end].iter().collect()));
        Ok(())
    });
    registry.add("replace", |s| {
        let to = pop_string(s)?;
        let from = pop_string(s)?;
        let text = pop_string(s)?;
        s.push(Value::String(text.replace(&from, &to)));
        Ok(())
    });
    registry.add("split", split_on_separator);
}

/// `sep text split` -> a `Tuple` of the pieces, in order. Exposed so
/// `date_time::register` can fall back to this when `split`'s top-of-stack
/// argument isn't a `DateTime` (the two modules share the operation name;
/// dispatch happens on the operand's runtime type, the same way the
/// numeric modules share arithmetic operator names across tiers).
pub(crate) fn split_on_separator(s: &mut Vec<Value>) -> Result<(), String> {
    let sep = pop_string(s)?;
    let text = pop_string(s)?;
    let parts: Vec<Value> = text.split(&sep as &str).map(|p| Value::String(p.to_string())).collect();
    s.push(Value::Tuple(parts));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concat_joins_in_order() {
        let registry = Registry::new();
        let mut stack = vec![Value::String("foo".to_string()), Value::String("bar".to_string())];
        (registry.get("concat").unwrap())(&mut stack).unwrap();
        assert_eq!(stack, vec![Value::String("foobar".to_string())]);
    }

    #[test]
    fn split_preserves_order() {
        let registry = Registry::new();
        let mut stack = vec![Value::String("a,b,c".to_string()), Value::String(",".to_string())];
        (registry.get("split").unwrap())(&mut stack).unwrap();
        assert_eq!(
            stack,
            vec![Value::Tuple(vec![Value::String("a".to_string()), Value::String("b".to_string()), Value::String("c".to_string())])]
        );
    }
}
