diesel::table! {
    clients (id) {
        id -> BigInt,
        name -> Nullable<Text>,
        description -> Nullable<Text>,
        status -> Text,
        priority -> BigInt,
    }
}
