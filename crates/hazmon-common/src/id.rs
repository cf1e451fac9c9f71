use snowflake::SnowflakeIdBucket;
use std::sync::Mutex;

static ID_GENERATOR: Mutex<Option<SnowflakeIdBucket>> = Mutex::new(None);

/// Initialize the Snowflake ID generator. Call once at process start;
/// `machine_id` and `node_id` are both in 0-31.
pub fn init(machine_id: i32, node_id: i32) {
    let mut gen = ID_GENERATOR.lock().unwrap();
    *gen = Some(SnowflakeIdBucket::new(machine_id, node_id));
}

/// Next Snowflake ID in string form, used as the primary key for every
/// table. Falls back to a (1, 1) bucket if `init` was never called.
pub fn next_id() -> String {
    let mut gen = ID_GENERATOR.lock().unwrap();
    let bucket = gen.get_or_insert_with(|| SnowflakeIdBucket::new(1, 1));
    bucket.get_id().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn ids_are_unique_and_numeric() {
        init(1, 1);
        let mut seen = HashSet::new();
        for _ in 0..1000 {
            let id = next_id();
            assert!(id.parse::<i64>().is_ok(), "ID should be a valid i64: {id}");
            assert!(seen.insert(id), "Duplicate ID generated");
        }
    }

    #[test]
    fn next_id_works_without_explicit_init() {
        let id = next_id();
        assert!(!id.is_empty());
    }
}
