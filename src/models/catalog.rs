//! Fixed vocabularies of the styling form.
//!
//! Every value serializes to the Korean label the form submits, and
//! `label()` returns the same text for prompt rendering.

use serde::{Deserialize, Serialize};

macro_rules! labelled_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $variant:ident => $label:literal $(| $alias:literal)* ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $label $(, alias = $alias)*)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn label(self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.label())
            }
        }
    };
}

labelled_enum! {
    Gender {
        Male => "남성",
        Female => "여성",
    }
}

labelled_enum! {
    /// Overall build. The simple form variant submits 슬림/표준/건장함.
    BodyType {
        Slim => "마른" | "슬림",
        Standard => "보통" | "표준",
        Chubby => "통통",
        Muscular => "근육질" | "건장함",
    }
}

labelled_enum! {
    SkinTone {
        Cool => "쿨톤",
        Warm => "웜톤",
        Neutral => "중성",
    }
}

labelled_enum! {
    ShoulderWidth {
        Narrow => "좁음",
        Average => "보통",
        Wide => "넓음",
    }
}

labelled_enum! {
    BodyShape {
        InvertedTriangle => "역삼각형",
        Triangle => "삼각형",
        Rectangle => "직사각형",
        Hourglass => "모래시계",
        Round => "원형",
        Trapezoid => "사다리꼴",
    }
}

labelled_enum! {
    TimeOfDay {
        Morning => "아침",
        Noon => "점심",
        Evening => "저녁",
        Night => "밤",
    }
}

labelled_enum! {
    Place {
        Indoor => "실내",
        Outdoor => "실외",
        Office => "사무실",
        Cafe => "카페",
        Club => "클럽",
        Restaurant => "레스토랑",
    }
}

labelled_enum! {
    Occasion {
        Date => "데이트",
        Meeting => "회의",
        Party => "파티",
        Workout => "운동",
        Shopping => "쇼핑",
        Daily => "일상",
    }
}

labelled_enum! {
    StyleOption {
        Casual => "캐주얼",
        Business => "비즈니스",
        Street => "스트리트",
        Minimal => "미니멀",
        Vintage => "빈티지",
        Sporty => "스포티",
    }
}

labelled_enum! {
    BodyConcern {
        Short => "키가 작음",
        ShortLegs => "다리가 짧음",
        BroadShoulders => "어깨가 넓음",
        UpperBody => "상체 비만",
        LowerBody => "하체 비만",
        ShortArms => "팔이 짧음",
        None => "없음",
    }
}

const MALE_SHAPES: &[BodyShape] = &[
    BodyShape::InvertedTriangle,
    BodyShape::Rectangle,
    BodyShape::Trapezoid,
    BodyShape::Round,
];

const FEMALE_SHAPES: &[BodyShape] = &[
    BodyShape::Hourglass,
    BodyShape::Triangle,
    BodyShape::InvertedTriangle,
    BodyShape::Rectangle,
    BodyShape::Round,
];

/// Body shapes offered for a gender.
pub fn body_shapes_for(gender: Gender) -> &'static [BodyShape] {
    match gender {
        Gender::Male => MALE_SHAPES,
        Gender::Female => FEMALE_SHAPES,
    }
}

pub const MAX_STYLE_OPTIONS: usize = 3;
