use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Raised when an integer code does not name a variant of a coded enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{kind} code {code} is not defined")]
pub struct UnknownCode {
    pub kind: &'static str,
    pub code: i32,
}

/// Declares an enum that is stored, bound and serialized as its integer
/// code and carries an Arabic display label per variant.
macro_rules! coded_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $($variant:ident = $code:literal => $label:literal,)+
        }
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord,
            Serialize, Deserialize, sqlx::Type,
        )]
        #[serde(into = "i32", try_from = "i32")]
        #[repr(i32)]
        pub enum $name {
            $($variant = $code,)+
        }

        impl $name {
            /// Every variant, in code order.
            pub const ALL: &'static [$name] = &[$($name::$variant,)+];

            pub fn code(self) -> i32 {
                self as i32
            }

            pub fn from_code(code: i32) -> Option<Self> {
                match code {
                    $($code => Some($name::$variant),)+
                    _ => None,
                }
            }

            /// Arabic display label.
            pub fn label(self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }

            /// English variant name, as used in token claims and logs.
            pub fn name(self) -> &'static str {
                match self {
                    $($name::$variant => stringify!($variant),)+
                }
            }
        }

        impl From<$name> for i32 {
            fn from(value: $name) -> i32 {
                value.code()
            }
        }

        impl TryFrom<i32> for $name {
            type Error = UnknownCode;

            fn try_from(code: i32) -> Result<Self, Self::Error> {
                $name::from_code(code).ok_or(UnknownCode {
                    kind: stringify!($name),
                    code,
                })
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.name())
            }
        }
    };
}

coded_enum! {
    /// Ownership/category of a university.
    UniversityType {
        Governmental = 1 => "جامعات حكومية",
        Private = 2 => "جامعات خاصة",
        National = 3 => "جامعات أهلية",
        HigherInstitute = 4 => "معاهد عالية",
        Foreign = 5 => "جامعات أجنبية",
        Technological = 6 => "جامعات تكنولوجية",
    }
}

coded_enum! {
    /// Egyptian governorates.
    Governorate {
        Cairo = 1 => "القاهرة",
        Alexandria = 2 => "الإسكندرية",
        Giza = 3 => "الجيزة",
        Sharqia = 4 => "الشرقية",
        Dakahlia = 5 => "الدقهلية",
        Beheira = 6 => "البحيرة",
        Monufia = 7 => "المنوفية",
        Gharbia = 8 => "الغربية",
        KafrElSheikh = 9 => "كفر الشيخ",
        Qalyubia = 10 => "القليوبية",
        BeniSuef = 11 => "بني سويف",
        Fayoum = 12 => "الفيوم",
        Minya = 13 => "المنيا",
        Asyut = 14 => "أسيوط",
        Sohag = 15 => "سوهاج",
        Qena = 16 => "قنا",
        Luxor = 17 => "الأقصر",
        Aswan = 18 => "أسوان",
        RedSea = 19 => "البحر الأحمر",
        NewValley = 20 => "الوادي الجديد",
        Matruh = 21 => "مطروح",
        NorthSinai = 22 => "شمال سيناء",
        SouthSinai = 23 => "جنوب سيناء",
        PortSaid = 24 => "بورسعيد",
        Ismailia = 25 => "الإسماعيلية",
        Suez = 26 => "السويس",
        Damietta = 27 => "دمياط",
    }
}

coded_enum! {
    /// Secondary-school track a department admits from.
    StudyType {
        Math = 1 => "علم رياضة",
        Science = 2 => "علم علوم",
        Literary = 3 => "أدبي",
        Industrial = 4 => "صنايع",
        American = 5 => "أمريكان",
    }
}

coded_enum! {
    UserRole {
        Admin = 1 => "مسؤول",
        Student = 2 => "طالب",
    }
}

impl Default for UserRole {
    fn default() -> Self {
        UserRole::Admin
    }
}

impl UserRole {
    /// Parses the English role name carried in token claims.
    pub fn from_name(name: &str) -> Option<Self> {
        UserRole::ALL
            .iter()
            .copied()
            .find(|role| role.name().eq_ignore_ascii_case(name))
    }
}
