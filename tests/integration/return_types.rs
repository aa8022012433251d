//! Repository query methods projecting onto every supported return shape

use std::net::{IpAddr, Ipv4Addr, ToSocketAddrs};

use chrono::{NaiveDate, TimeZone, Utc};
use cqlmap_core::{Decimal, IntoCql, Value};
use integration_tests::{open_repository, AllPossibleTypes, Condition, TestRepository};
use num_bigint::BigInt;

fn by_id(id: &str) -> Vec<Value> {
    vec![id.to_cql()]
}

fn localhost() -> IpAddr {
    ("localhost", 0)
        .to_socket_addrs()
        .unwrap()
        .next()
        .unwrap()
        .ip()
}

async fn repository_with(entity: &AllPossibleTypes) -> TestRepository {
    let repository = open_repository().await.unwrap();
    repository.delete_all().await.unwrap();
    repository.save(entity).await.unwrap();
    repository
}

#[tokio::test]
async fn test_returns_optional_entity() {
    let entity = AllPossibleTypes::new("123");
    let repository = repository_with(&entity).await;

    let found = repository
        .find_optional("find_optional_by_id", &by_id("123"))
        .await
        .unwrap();
    assert_eq!(found, Some(entity));

    let missing = repository
        .find_optional("find_optional_by_id", &by_id("456"))
        .await
        .unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
async fn test_returns_single_entity() {
    let mut entity = AllPossibleTypes::new("123");
    entity.text = Some("hello".to_string());
    entity.list_of_string = vec!["b".to_string(), "a".to_string()];
    let repository = repository_with(&entity).await;

    let found = repository
        .find_one("find_one_by_id", &by_id("123"))
        .await
        .unwrap();
    assert_eq!(found, entity);
}

#[tokio::test]
async fn test_returns_entity_list() {
    let entity = AllPossibleTypes::new("123");
    let repository = repository_with(&entity).await;

    let found = repository
        .find_many("find_many_by_id", &by_id("123"))
        .await
        .unwrap();
    assert!(!found.is_empty());
    assert!(found.contains(&entity));

    let none = repository
        .find_many("find_many_by_id", &by_id("456"))
        .await
        .unwrap();
    assert!(none.is_empty());
}

#[tokio::test]
async fn test_returns_inet_address() {
    let mut entity = AllPossibleTypes::new("123");
    entity.inet = Some(localhost());
    let repository = repository_with(&entity).await;

    let inet: IpAddr = repository
        .scalar("find_inet_address_by_id", &by_id("123"))
        .await
        .unwrap();
    assert_eq!(Some(inet), entity.inet);
}

#[tokio::test]
async fn test_returns_optional_inet_address() {
    let mut entity = AllPossibleTypes::new("123");
    entity.inet = Some(localhost());
    let repository = repository_with(&entity).await;

    let inet = repository
        .optional::<IpAddr>("find_optional_inet_by_id", &by_id("123"))
        .await
        .unwrap();
    assert_eq!(inet, entity.inet);

    let missing = repository
        .optional::<IpAddr>("find_optional_inet_by_id", &by_id("456"))
        .await
        .unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
async fn test_returns_boxed_byte() {
    let mut entity = AllPossibleTypes::new("123");
    entity.boxed_byte = Some(1);
    let repository = repository_with(&entity).await;

    let value = repository
        .nullable::<i8>("find_boxed_byte_by_id", &by_id("123"))
        .await
        .unwrap();
    assert_eq!(value, Some(1));
}

#[tokio::test]
async fn test_returns_primitive_byte() {
    let mut entity = AllPossibleTypes::new("123");
    entity.primitive_byte = i8::MAX;
    let repository = repository_with(&entity).await;

    let value: i8 = repository
        .scalar("find_primitive_byte_by_id", &by_id("123"))
        .await
        .unwrap();
    assert_eq!(value, i8::MAX);

    let widened: i64 = repository
        .scalar("find_long_from_byte_by_id", &by_id("123"))
        .await
        .unwrap();
    assert_eq!(widened, i64::from(i8::MAX));
}

#[tokio::test]
async fn test_returns_boxed_short() {
    let mut entity = AllPossibleTypes::new("123");
    entity.boxed_short = Some(i16::MAX);
    let repository = repository_with(&entity).await;

    let value = repository
        .nullable::<i16>("find_boxed_short_by_id", &by_id("123"))
        .await
        .unwrap();
    assert_eq!(value, Some(i16::MAX));
}

#[tokio::test]
async fn test_returns_boxed_long() {
    let mut entity = AllPossibleTypes::new("123");
    entity.boxed_long = Some(i64::MAX);
    let repository = repository_with(&entity).await;

    let value = repository
        .nullable::<i64>("find_boxed_long_by_id", &by_id("123"))
        .await
        .unwrap();
    assert_eq!(value, Some(i64::MAX));
}

#[tokio::test]
async fn test_returns_boxed_integer() {
    let mut entity = AllPossibleTypes::new("123");
    entity.boxed_integer = Some(i32::MAX);
    let repository = repository_with(&entity).await;

    let value = repository
        .nullable::<i32>("find_boxed_integer_by_id", &by_id("123"))
        .await
        .unwrap();
    assert_eq!(value, Some(i32::MAX));
}

#[tokio::test]
async fn test_returns_boxed_double() {
    let mut entity = AllPossibleTypes::new("123");
    entity.boxed_double = Some(f64::MAX);
    let repository = repository_with(&entity).await;

    let value = repository
        .nullable::<f64>("find_boxed_double_by_id", &by_id("123"))
        .await
        .unwrap();
    assert_eq!(value, Some(f64::MAX));
}

#[tokio::test]
async fn test_returns_double_from_integer() {
    let mut entity = AllPossibleTypes::new("123");
    entity.boxed_integer = Some(i32::MAX);
    let repository = repository_with(&entity).await;

    let value = repository
        .nullable::<f64>("find_double_from_integer_by_id", &by_id("123"))
        .await
        .unwrap()
        .unwrap();
    assert!((value - f64::from(i32::MAX)).abs() < 0.01);
}

#[tokio::test]
async fn test_returns_double_from_float() {
    let mut entity = AllPossibleTypes::new("123");
    entity.primitive_float = 1.5;
    let repository = repository_with(&entity).await;

    let value: f64 = repository
        .scalar("find_double_from_float_by_id", &by_id("123"))
        .await
        .unwrap();
    assert_eq!(value, 1.5);
}

#[tokio::test]
async fn test_returns_boxed_boolean() {
    let mut entity = AllPossibleTypes::new("123");
    entity.boxed_boolean = Some(true);
    let repository = repository_with(&entity).await;

    let value = repository
        .nullable::<bool>("find_boxed_boolean_by_id", &by_id("123"))
        .await
        .unwrap();
    assert_eq!(value, Some(true));
}

#[tokio::test]
async fn test_returns_date() {
    let day_one = NaiveDate::from_ymd_opt(1970, 1, 2).unwrap();
    let mut entity = AllPossibleTypes::new("123");
    entity.date = Some(day_one);
    let repository = repository_with(&entity).await;

    let value: NaiveDate = repository
        .scalar("find_local_date_by_id", &by_id("123"))
        .await
        .unwrap();
    assert_eq!(value, day_one);
}

#[tokio::test]
async fn test_returns_timestamp() {
    let one_milli = Utc.timestamp_millis_opt(1).unwrap();
    let mut entity = AllPossibleTypes::new("123");
    entity.timestamp = Some(one_milli);
    let repository = repository_with(&entity).await;

    let value: chrono::DateTime<Utc> = repository
        .scalar("find_timestamp_by_id", &by_id("123"))
        .await
        .unwrap();
    assert_eq!(value, one_milli);
}

#[tokio::test]
async fn test_returns_time() {
    let noon = chrono::NaiveTime::from_hms_nano_opt(12, 0, 0, 1).unwrap();
    let mut entity = AllPossibleTypes::new("123");
    entity.local_time = Some(noon);
    let repository = repository_with(&entity).await;

    let value = repository
        .nullable::<chrono::NaiveTime>("find_local_time_by_id", &by_id("123"))
        .await
        .unwrap();
    assert_eq!(value, Some(noon));
}

#[tokio::test]
async fn test_returns_big_decimal() {
    let mut entity = AllPossibleTypes::new("123");
    entity.big_decimal = Some(Decimal::one());
    let repository = repository_with(&entity).await;

    let value: Decimal = repository
        .scalar("find_big_decimal_by_id", &by_id("123"))
        .await
        .unwrap();
    assert_eq!(value, Decimal::one());
}

#[tokio::test]
async fn test_returns_big_integer() {
    let mut entity = AllPossibleTypes::new("123");
    entity.big_integer = Some(BigInt::from(1));
    let repository = repository_with(&entity).await;

    let value: BigInt = repository
        .scalar("find_big_integer_by_id", &by_id("123"))
        .await
        .unwrap();
    assert_eq!(value, BigInt::from(1));

    let decimal: Decimal = repository
        .scalar("find_decimal_from_big_integer_by_id", &by_id("123"))
        .await
        .unwrap();
    assert_eq!(decimal, Decimal::new(1, 0));
}

#[tokio::test]
async fn test_returns_uuid_ascii_blob_and_enum() {
    let id = uuid::Uuid::from_u128(0x1234);
    let mut entity = AllPossibleTypes::new("123");
    entity.uuid = Some(id);
    entity.ascii = Some("plain".to_string());
    entity.blob = Some(bytes::Bytes::from_static(b"\x00\x01"));
    entity.an_enum = Some(Condition::Used);
    let repository = repository_with(&entity).await;
    let args = by_id("123");

    assert_eq!(
        repository
            .optional::<uuid::Uuid>("find_uuid_by_id", &args)
            .await
            .unwrap(),
        Some(id)
    );
    assert_eq!(
        repository
            .nullable::<String>("find_ascii_by_id", &args)
            .await
            .unwrap()
            .as_deref(),
        Some("plain")
    );
    assert_eq!(
        repository
            .nullable::<bytes::Bytes>("find_blob_by_id", &args)
            .await
            .unwrap(),
        entity.blob
    );
    assert_eq!(
        repository
            .nullable::<Condition>("find_enum_by_id", &args)
            .await
            .unwrap(),
        Some(Condition::Used)
    );
}

#[tokio::test]
async fn test_returns_entity_as_map() {
    let mut entity = AllPossibleTypes::new("123");
    entity.primitive_integer = 123;
    entity.big_integer = Some(BigInt::from(1));
    let repository = repository_with(&entity).await;

    let row = repository
        .row_map("find_entity_as_map_by_id", &by_id("123"))
        .await
        .unwrap();
    assert_eq!(row.len(), 43);
    assert_eq!(row.get("primitiveinteger"), Some(&Value::Int(123)));
    assert_eq!(row.get("biginteger"), Some(&Value::Varint(BigInt::from(1))));
    assert_eq!(row.get("boxedinteger"), Some(&Value::Null));
}

#[tokio::test]
async fn test_collections_round_trip() {
    let mut entity = AllPossibleTypes::new("123");
    entity.set_of_enum = [Condition::Mint, Condition::Used].into_iter().collect();
    entity.list_of_integer = vec![3, 1, 2];
    entity
        .map_of_uuid
        .insert(uuid::Uuid::from_u128(7), "seven".to_string());
    entity.set_of_inet.insert(IpAddr::V4(Ipv4Addr::LOCALHOST));
    entity.list_of_date.push(NaiveDate::from_ymd_opt(2020, 2, 29).unwrap());
    let repository = repository_with(&entity).await;

    let found = repository.find_by_id("123").await.unwrap();
    assert_eq!(found, Some(entity));
}
