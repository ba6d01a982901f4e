/// UUID をラップした ID 型を定義する
///
/// `struct 名前 as "ラベル";` の形で書く。ラベルはパース失敗時の
/// エラーメッセージに使う。
///
/// 生成される ID 型は JSON 上では素の UUID 文字列として現れ、
/// パスパラメータからは [`std::str::FromStr`] で読み取る。
/// 新規発行は時系列順に並ぶ UUID v7。
///
/// ```rust
/// use vybbi_domain::event::EventId;
///
/// let id = EventId::new();
/// assert_eq!(id.to_string().parse::<EventId>().unwrap(), id);
/// assert!("not-a-uuid".parse::<EventId>().is_err());
/// ```
macro_rules! define_uuid_id {
    (
        $(#[$meta:meta])*
        $vis:vis struct $Name:ident as $label:literal;
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, PartialEq, Eq, Hash,
            serde::Serialize, serde::Deserialize,
            derive_more::Display, derive_more::From,
        )]
        #[display("{_0}")]
        #[serde(transparent)]
        $vis struct $Name(uuid::Uuid);

        impl $Name {
            pub fn new() -> Self {
                Self(uuid::Uuid::now_v7())
            }

            pub fn from_uuid(uuid: uuid::Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &uuid::Uuid {
                &self.0
            }
        }

        impl Default for $Name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl From<$Name> for uuid::Uuid {
            fn from(id: $Name) -> Self {
                id.0
            }
        }

        impl std::str::FromStr for $Name {
            type Err = $crate::DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.parse::<uuid::Uuid>().map(Self).map_err(|_| {
                    $crate::DomainError::Validation(format!(
                        concat!($label, " ID として解釈できません: {}"),
                        s
                    ))
                })
            }
        }
    };
}
