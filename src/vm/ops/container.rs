//! `Tuple`/`Dict` construction and access (§4.4, §4.7). Dicts are
//! insertion-ordered association lists, matching `Value::Dict`'s own
//! representation (§4.4 "insertion order is significant and preserved").

use crate::value::tagged::Value;
use crate::vm::ops::{pop, pop_i64, pop_string};
use crate::vm::registry::Registry;

fn pop_tuple(stack: &mut Vec<Value>) -> Result<Vec<Value>, String> {
    match pop(stack)? {
        Value::Tuple(items) => Ok(items),
        other => Err(format!("expected a tuple, found {}", other.type_name())),
    }
}

fn pop_dict(stack: &mut Vec<Value>) -> Result<Vec<(String, Value)>, String> {
    match pop(stack)? {
        Value::Dict(entries) => Ok(entries),
        other => Err(format!("expected a dict, found {}", other.type_name())),
    }
}

pub fn register(registry: &mut Registry) {
    registry.add("null", |s| {
        s.push(Value::Null);
        Ok(())
    });
    registry.add("null?", |s| {
        let is_null = matches!(s.last(), Some(Value::Null));
        s.push(Value::Boolean(is_null));
        Ok(())
    });

    registry.add("tuple", |s| {
        let n = pop_i64(s)?;
        if n < 0 || n as usize > s.len() {
            return Err("tuple: not enough values on the stack".to_string());
        }
        let start = s.len() - n as usize;
        let items: Vec<Value> = s.split_off(start);
        s.push(Value::Tuple(items));
        Ok(())
    });
    registry.add("tuple?", |s| {
        let is_tuple = matches!(s.last(), Some(Value::Tuple(_)));
        s.push(Value::Boolean(is_tuple));
        Ok(())
    });
    registry.add("tuple.get", |s| {
        let index = pop_i64(s)?;
        let items = pop_tuple(s)?;
        let item = items
            .get(index as usize)
            .cloned()
            .ok_or_else(|| format!("tuple index {index} out of bounds ({})", items.len()))?;
        s.push(item);
        Ok(())
    });
    registry.add("tuple.len", |s| {
        let items = pop_tuple(s)?;
        s.push(Value::Long(items.len() as i64));
        Ok(())
    });

    registry.add("dict.empty", |s| {
        s.push(Value::Dict(Vec::new()));
        Ok(())
    });
    registry.add("dict?", |s| {
        let is_dict = matches!(s.last(), Some(Value::Dict(_)));
        s.push(Value::Boolean(is_dict));
        Ok(())
    });
    registry.add("dict.put", |s| {
        let value = pop(s)?;
        let key = pop_string(s)?;
        let mut entries = pop_dict(s)?;
        if let Some(slot) = entries.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = value;
        } else {
            entries.push((key, value));
        }
        s.push(Value::Dict(entries));
        Ok(())
    });
    registry.add("dict.get", |s| {
        let key = pop_string(s)?;
        let entries = pop_dict(s)?;
        s.push(Value::dict_get(&entries, &key).cloned().unwrap_or(Value::Null));
        Ok(())
    });
    registry.add("dict.keys", |s| {
        let entries = pop_dict(s)?;
        s.push(Value::Tuple(entries.into_iter().map(|(k, _)| Value::String(k)).collect()));
        Ok(())
    });
    registry.add("dict.len", |s| {
        let entries = pop_dict(s)?;
        s.push(Value::Long(entries.len() as i64));
        Ok(())
    });

    registry.add("bytes.len", |s| {
        let v = pop(s)?;
        match v {
            Value::Bytes(b) => s.push(Value::Long(b.len() as i64)),
            other => return Err(format!("expected bytes, found {}", other.type_name())),
        }
        Ok(())
    });
}
