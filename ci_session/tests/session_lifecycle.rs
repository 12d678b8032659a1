mod common;

use ci_session::{CI_LAST_REGENERATE_KEY, PhpValue, SessionData, SessionError};
use common::{file_binding, session_file};
use proptest::prelude::*;

#[tokio::test]
async fn test_login_then_next_request() {
    // Given a login request that stores a user and a flash message
    let (binding, dir) = file_binding();
    let record = binding.create_and_bind().unwrap();
    record.set_user_data("uid", "42").await.unwrap();
    record.set_flash("info", "welcome").await.unwrap();
    binding.persist(&record).await.unwrap();
    assert!(session_file(&dir, record.id().as_str()).exists());

    // When the next request resolves the same cookie value
    let next = binding
        .resolve_from_token(record.id().as_str())
        .await
        .unwrap();

    // Then the user is there and the flash can be read exactly once
    assert_eq!(next.get_user_data("uid").await.unwrap(), PhpValue::from("42"));
    assert_eq!(next.get_flash_string("info").await.unwrap(), "welcome");
    assert_eq!(next.get_flash_string("info").await.unwrap(), "");

    // And the consumed flash stays gone after another round trip
    binding.persist(&next).await.unwrap();
    let third = binding
        .resolve_from_token(record.id().as_str())
        .await
        .unwrap();
    assert!(!third.has("info").await);
    assert_eq!(third.get_user_data("uid").await.unwrap(), PhpValue::from("42"));
}

#[tokio::test]
async fn test_corrupt_session_file() {
    // Given a session file that is not PHP session data
    let (binding, dir) = file_binding();
    std::fs::write(session_file(&dir, "corrupt"), "uid|s:10:\"short\";").unwrap();

    // When resolving it
    let result = binding.resolve_from_token("corrupt").await;

    // Then a decode error is returned instead of an empty session
    assert!(matches!(result, Err(SessionError::Decode { .. })));
}

#[tokio::test]
async fn test_logout_removes_session_file() {
    let (binding, dir) = file_binding();
    let record = binding.create_and_bind().unwrap();
    record.set_user_data("uid", "42").await.unwrap();
    binding.persist(&record).await.unwrap();

    binding.destroy(&record).await.unwrap();
    binding.persist(&record).await.unwrap();

    assert!(!session_file(&dir, record.id().as_str()).exists());
    assert!(matches!(
        binding.resolve_from_token(record.id().as_str()).await,
        Err(SessionError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_concurrent_writers_on_one_record() {
    // Given one record shared by many tasks
    let (binding, _dir) = file_binding();
    let record = binding.create_and_bind().unwrap();

    // When every task writes its own key
    let handles: Vec<_> = (0..32)
        .map(|i| {
            let record = record.clone();
            tokio::spawn(async move {
                record
                    .set_user_data(&format!("key{i}"), i as i64)
                    .await
                    .unwrap();
            })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap();
    }
    binding.persist(&record).await.unwrap();

    // Then no update was lost on disk
    let loaded = binding
        .resolve_from_token(record.id().as_str())
        .await
        .unwrap();
    for i in 0..32 {
        assert_eq!(
            loaded.get(&format!("key{i}")).await.unwrap(),
            PhpValue::Int(i)
        );
    }
}

#[tokio::test]
async fn test_file_shared_with_php() {
    // Given a file as CodeIgniter writes it
    let (binding, dir) = file_binding();
    let now = chrono::Utc::now().timestamp();
    let payload = format!(
        "{CI_LAST_REGENERATE_KEY}|i:{now};my_login_session|s:9:\"logged_in\";\
         cart|a:2:{{i:0;s:5:\"apple\";i:1;s:6:\"banana\";}}"
    );
    std::fs::write(session_file(&dir, "shared"), &payload).unwrap();

    // When Rust reads it, changes nothing and writes it back
    let record = binding.resolve_from_token("shared").await.unwrap();
    let cart = record.get("cart").await.unwrap();
    assert!(cart.as_array().unwrap().is_list());
    binding.persist(&record).await.unwrap();

    // Then every variable other than the stamp survives unchanged
    let written = std::fs::read_to_string(session_file(&dir, "shared")).unwrap();
    let mut before = SessionData::decode(&payload).unwrap();
    let mut after = SessionData::decode(&written).unwrap();
    before.remove(CI_LAST_REGENERATE_KEY);
    after.remove(CI_LAST_REGENERATE_KEY);
    assert_eq!(before, after);
}

fn scalar_value() -> impl Strategy<Value = PhpValue> {
    prop_oneof![
        any::<String>().prop_map(PhpValue::from),
        any::<i64>().prop_map(PhpValue::from),
        any::<bool>().prop_map(PhpValue::from),
        Just(PhpValue::Null),
    ]
}

proptest! {
    #[test]
    fn test_scalar_session_round_trip(
        fields in proptest::collection::btree_map("[a-z_][a-z0-9_]{0,15}", scalar_value(), 0..8)
    ) {
        let mut data = SessionData::new();
        for (key, value) in &fields {
            data.insert(key, value.clone());
        }

        let encoded = data.encode().unwrap();
        let decoded = SessionData::decode(&encoded).unwrap();

        prop_assert_eq!(decoded, data);
    }
}
