use tokio::sync::OnceCell;

pub(crate) static PERSIST_SCRIPT_HASH: OnceCell<String> = OnceCell::const_new();

// ARGV[1] is the key ttl in seconds (<= 0 disables expiry), followed by field/value pairs.
pub(crate) static PERSIST_SCRIPT: &str = r#"
    local key = KEYS[1]
    local seconds = tonumber(ARGV[1])

    redis.call('DEL', key)

    if #ARGV < 3 then
        return 0
    end

    redis.call('HSET', key, unpack(ARGV, 2))

    if seconds > 0 then
        redis.call('EXPIRE', key, seconds)
    end

    return (#ARGV - 1) / 2
"#;
