//! Prompt templates sent to the styling model.
//!
//! Every builder here is pure: identical input produces a byte-identical prompt.

use crate::models::{
    BodyConcern, BodyInfo, CoordinateRequest, ImageGenerationRequest, StyleOption, Tpo,
};
use crate::utils::language::Language;

const ANALYSIS_JSON_WITH_SCORE: &str = r##"```json
{
  "score": 75,
  "stylingTips": [
    "구체적이고 실용적인 팁 1",
    "구체적이고 실용적인 팁 2",
    "구체적이고 실용적인 팁 3",
    "구체적이고 실용적인 팁 4",
    "구체적이고 실용적인 팁 5"
  ],
  "accessories": [
    {
      "name": "액세서리 이름",
      "description": "20자 이내 설명",
      "reason": "이 액세서리가 스타일을 완성시키는 이유"
    }
  ],
  "colorPalette": ["#HEXCODE1", "#HEXCODE2", "#HEXCODE3", "#HEXCODE4", "#HEXCODE5"],
  "overallComment": "전반적인 스타일 진단과 개선 방향을 150-200자로 요약"
}
```"##;

const ANALYSIS_JSON_GUIDE: &str = r##"```json
{
  "stylingTips": [
    "구체적인 아이템과 스타일링 방법 (예: 하이웨스트 팬츠로 다리 길이 보정)",
    "색상 조합 가이드 (예: 네이비 재킷 + 화이트 셔츠로 깔끔한 이미지)",
    "핏과 실루엣 추천 (예: 오버사이즈보다 슬림핏으로 체형 강조)",
    "레이어링 방법 (예: 얇은 카디건으로 입체감 추가)",
    "상황별 활용 팁 (예: 포멀한 자리엔 넥타이, 캐주얼엔 스카프)"
  ],
  "accessories": [
    {
      "name": "추천 액세서리 이름",
      "description": "어떤 스타일인지 설명",
      "reason": "왜 이 사용자에게 어울리는지"
    }
  ],
  "colorPalette": [
    {
      "name": "색상 이름 (예: 네이비 블루)",
      "hex": "#HEXCODE",
      "usage": "메인 컬러/포인트 컬러/액센트 등 활용 방법"
    }
  ],
  "overallComment": "이 사용자에게 어울리는 전체적인 스타일 방향성과 핵심 포인트를 친근하게 설명 (200자 이내)"
}
```"##;

const SCORE_RUBRIC: &str = "### 점수 기준 (0-100)
- **90-100**: 완벽한 조화, TPO 최적, 체형 보완 탁월
- **80-89**: 우수한 스타일링, 약간의 개선 여지
- **70-79**: 양호, 몇 가지 개선 필요
- **60-69**: 보통, 상당한 개선 필요
- **0-59**: 전반적인 재검토 필요";

fn numbered<T: AsRef<str>>(items: &[T]) -> String {
    items
        .iter()
        .enumerate()
        .map(|(index, item)| format!("{}. {}", index + 1, item.as_ref()))
        .collect::<Vec<_>>()
        .join("\n")
}

fn joined_labels<T: std::fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn format_measure(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

fn body_section(info: &BodyInfo) -> String {
    let mut lines = Vec::new();
    if let Some(gender) = info.gender {
        lines.push(format!("- **성별**: {gender}"));
    }
    lines.push(format!("- **신장**: {}cm", format_measure(info.height)));
    lines.push(format!("- **체중**: {}kg", format_measure(info.weight)));
    lines.push(format!("- **체형**: {}", info.body_type));
    lines.push(format!("- **피부톤**: {}", info.skin_tone));
    if let Some(shoulder) = info.shoulder_width {
        lines.push(format!("- **어깨 너비**: {shoulder}"));
    }
    if let Some(shape) = info.body_shape {
        lines.push(format!("- **체형 유형**: {shape}"));
    }
    lines.join("\n")
}

fn tpo_section(tpo: &Tpo) -> String {
    format!(
        "- **시간대**: {}\n- **장소**: {}\n- **상황**: {}",
        tpo.time, tpo.place, tpo.occasion
    )
}

fn concern_section(concerns: &[BodyConcern]) -> String {
    if concerns.is_empty() {
        "- 특별한 고민 없음".to_string()
    } else {
        numbered(&concerns.iter().map(|c| c.label()).collect::<Vec<_>>())
    }
}

fn style_section(styles: &[StyleOption]) -> String {
    numbered(&styles.iter().map(|s| s.label()).collect::<Vec<_>>())
}

/// Analysis prompt. With a photo the model also scores the current outfit.
pub fn coordination_prompt(request: &CoordinateRequest, with_photo: bool) -> String {
    let intro = if with_photo {
        "당신은 전문 패션 스타일리스트이자 이미지 컨설턴트입니다.\n제공된 사용자 사진을 세밀하게 분석하고, 아래 정보를 종합하여 최적의 코디네이션을 추천해주세요."
    } else {
        "당신은 전문 패션 스타일리스트입니다. 제공된 사용자의 상세한 체형 정보를 분석하고, 최적의 코디네이션을 추천해주세요."
    };

    let requests = if with_photo {
        "1. **현재 스타일 분석**: 사진 속 착용 의상의 핏, 색상, 스타일과 체형 조화도, TPO 적합성 평가
2. **개선 포인트**: 신체 비율을 보완하는 아이템, 피부톤에 맞는 색상, 체형 고민을 커버하는 실루엣
3. **구체적 코디네이션 가이드**: 상의/하의/신발/아우터 조합, 레이어링, 소재와 패턴
4. **스타일링 디테일**: 액세서리 활용법, 헤어스타일 제안"
    } else {
        "1. **체형 분석**: 사용자의 신체 특징과 고민사항을 고려한 맞춤 가이드
2. **스타일 추천**: 선호 스타일과 TPO에 어울리는 코디 제안
3. **실용적 팁**: 바로 적용 가능한 구체적인 스타일링 조언
4. **컬러 가이드**: 피부톤에 어울리는 색상 팔레트"
    };

    let response_format = if with_photo {
        format!("{ANALYSIS_JSON_WITH_SCORE}\n\n{SCORE_RUBRIC}")
    } else {
        ANALYSIS_JSON_GUIDE.to_string()
    };

    let mut prompt = format!("{intro}\n\n");
    prompt.push_str(&format!(
        "## 사용자 프로필\n### 신체 정보\n{}\n\n",
        body_section(&request.body_info)
    ));
    prompt.push_str(&format!(
        "### 선호 스타일\n{}\n\n",
        style_section(&request.style_options)
    ));
    prompt.push_str(&format!(
        "### 착용 상황 (TPO)\n{}\n\n",
        tpo_section(&request.tpo)
    ));
    prompt.push_str(&format!(
        "### 신체 고민 사항\n{}\n\n",
        concern_section(&request.effective_concerns())
    ));
    prompt.push_str(&format!("## 요청사항\n{requests}\n\n"));
    prompt.push_str("## 응답 형식\n**반드시 아래 JSON 형식으로만 응답해주세요:**\n\n");
    prompt.push_str(&format!("{response_format}\n\n"));
    prompt.push_str(
        "### 주의사항
- 스타일링 팁은 최대 5개, 액세서리는 최대 3개, 색상은 최대 5개
- 색상 코드는 반드시 유효한 Hex 코드로 제공
- 액세서리는 실제 구매 가능한 일반적인 아이템으로\n",
    );
    if with_photo {
        prompt.push_str("- 모든 조언은 구체적이고 실행 가능해야 합니다");
    } else {
        prompt.push_str(
            "- 평가나 비판이 아닌, 긍정적이고 실용적인 가이드를 \"~하면 더 좋아요\", \"~을 추천해요\" 같은 톤으로 작성",
        );
    }
    prompt
}

fn person_description(has_photo: bool, include_face: bool) -> &'static str {
    match (has_photo, include_face) {
        (true, true) => "위 사진 속 인물과 동일한 얼굴, 체형, 피부톤으로 생성",
        (true, false) => {
            "위 사진 속 인물과 동일한 체형, 피부톤의 모델로 생성 (얼굴은 가상의 모델 얼굴 사용)"
        }
        (false, _) => "위 인물 정보와 같은 체형, 피부톤을 가진 가상의 모델로 생성",
    }
}

/// Composite lookbook prompt: the same person in three outfits side by side.
pub fn image_generation_prompt(
    request: &ImageGenerationRequest,
    has_photo: bool,
    language: Language,
) -> String {
    let concerns = request.effective_concerns();
    let concerns = if concerns.is_empty() {
        "없음".to_string()
    } else {
        joined_labels(&concerns)
    };
    let accessories = if request.accessories.is_empty() {
        "없음".to_string()
    } else {
        request
            .accessories
            .iter()
            .map(|accessory| accessory.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    };
    let colors = request
        .color_palette
        .iter()
        .map(|color| color.describe())
        .collect::<Vec<_>>()
        .join(", ");

    let mut prompt = String::from(
        "이 사람을 위한 3가지 다른 패션 코디 옵션을 나란히 보여주는 이미지 1장을 생성해주세요.\n\n",
    );
    prompt.push_str(&format!(
        "## 인물 정보\n{}\n- **신체 고민**: {concerns}\n\n",
        body_section(&request.body_info)
    ));
    prompt.push_str(&format!(
        "## 착용 상황 (TPO)\n{}, {}에서 {} 상황\n\n",
        request.tpo.time, request.tpo.place, request.tpo.occasion
    ));
    prompt.push_str(&format!(
        "## 코디 스타일\n스타일: {}\n\n",
        joined_labels(&request.style_options)
    ));
    prompt.push_str(&format!(
        "## 구체적인 스타일링 가이드\n{}\n\n",
        numbered(&request.styling_tips)
    ));
    prompt.push_str(&format!("## 추천 컬러\n{colors}\n\n"));
    prompt.push_str(&format!("## 추천 액세서리\n{accessories}\n\n"));
    prompt.push_str("---\n\n**이미지 생성 요구사항:**\n");
    prompt.push_str(&format!(
        "1. {}\n",
        person_description(has_photo, request.include_face)
    ));
    prompt.push_str(
        "2. 같은 인물이 서로 다른 3가지 코디를 입은 모습을 가로로 나란히 배치
3. 각 코디는 전신 샷(머리부터 발끝까지)
4. 3가지 코디 모두 위 스타일링 가이드를 기반으로 하되, 각각 다른 조합으로 구성:
   - 첫 번째: 가장 포멀하고 정통적인 스타일
   - 두 번째: 캐주얼하면서도 세련된 스타일
   - 세 번째: 액세서리와 컬러를 강조한 대담한 스타일
5. TPO에 적합한 코디네이션
6. 추천 컬러 팔레트 색상 활용
7. 깔끔하고 전문적인 패션 룩북 스타일
8. 고화질, 자연스러운 조명
9. 3개의 코디가 한 장의 이미지에 균등하게 배치\n",
    );
    prompt.push_str(&format!(
        "10. 이미지 안에 글자를 넣는 경우 {}로 작성\n\n",
        language.eng_name()
    ));
    prompt.push_str("이미지 1장만 생성하세요.");
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        Accessory, BodyShape, BodyType, Gender, Occasion, PaletteColor, Place, ShoulderWidth,
        SkinTone, TimeOfDay,
    };

    fn request() -> CoordinateRequest {
        CoordinateRequest {
            body_info: BodyInfo {
                gender: Some(Gender::Female),
                height: 163.0,
                weight: 52.5,
                body_type: BodyType::Slim,
                skin_tone: SkinTone::Warm,
                shoulder_width: Some(ShoulderWidth::Narrow),
                body_shape: Some(BodyShape::Hourglass),
            },
            style_options: vec![StyleOption::Minimal, StyleOption::Vintage],
            tpo: Tpo {
                time: TimeOfDay::Evening,
                place: Place::Restaurant,
                occasion: Occasion::Date,
            },
            body_concerns: vec![BodyConcern::ShortLegs],
        }
    }

    #[test]
    fn analysis_prompt_is_deterministic() {
        let request = request();
        assert_eq!(
            coordination_prompt(&request, false),
            coordination_prompt(&request, false)
        );
        assert_eq!(
            coordination_prompt(&request, true),
            coordination_prompt(&request, true)
        );
    }

    #[test]
    fn analysis_prompt_interpolates_profile() {
        let prompt = coordination_prompt(&request(), false);
        assert!(prompt.contains("- **성별**: 여성"));
        assert!(prompt.contains("- **신장**: 163cm"));
        assert!(prompt.contains("- **체중**: 52.5kg"));
        assert!(prompt.contains("- **체형 유형**: 모래시계"));
        assert!(prompt.contains("1. 미니멀\n2. 빈티지"));
        assert!(prompt.contains("- **장소**: 레스토랑"));
        assert!(prompt.contains("1. 다리가 짧음"));
        assert!(!prompt.contains("\"score\""));
    }

    #[test]
    fn photo_variant_requests_a_score() {
        let prompt = coordination_prompt(&request(), true);
        assert!(prompt.contains("\"score\": 75"));
        assert!(prompt.contains("점수 기준"));
        assert!(prompt.contains("사진"));
    }

    #[test]
    fn optional_body_fields_are_omitted() {
        let mut request = request();
        request.body_info.gender = None;
        request.body_info.shoulder_width = None;
        request.body_info.body_shape = None;
        request.body_concerns = vec![BodyConcern::None];
        let prompt = coordination_prompt(&request, false);
        assert!(!prompt.contains("성별"));
        assert!(!prompt.contains("어깨 너비"));
        assert!(prompt.contains("- 특별한 고민 없음"));
    }

    fn image_request(include_face: bool) -> ImageGenerationRequest {
        let mut image_request = ImageGenerationRequest::from_analysis(
            &request(),
            &crate::models::CoordinateResult {
                styling_tips: vec!["하이웨스트 팬츠".to_string(), "니트 카디건".to_string()],
                accessories: vec![Accessory {
                    name: "골드 귀걸이".to_string(),
                    ..Accessory::default()
                }],
                color_palette: vec![
                    PaletteColor::Hex("#FFFFFF".to_string()),
                    PaletteColor::Named {
                        name: "네이비".to_string(),
                        hex: "#1F2A44".to_string(),
                        usage: "메인".to_string(),
                    },
                ],
                ..Default::default()
            },
            include_face,
        );
        image_request.body_concerns.clear();
        image_request
    }

    #[test]
    fn face_flag_selects_person_sentence() {
        let with_face = image_generation_prompt(&image_request(true), true, Language::Korean);
        assert!(with_face.contains("1. 위 사진 속 인물과 동일한 얼굴, 체형, 피부톤으로 생성"));

        let without_face = image_generation_prompt(&image_request(false), true, Language::Korean);
        assert!(without_face.contains("얼굴은 가상의 모델 얼굴 사용"));

        let no_photo = image_generation_prompt(&image_request(true), false, Language::Korean);
        assert!(no_photo.contains("가상의 모델로 생성"));
        assert!(!no_photo.contains("사진 속 인물"));
    }

    #[test]
    fn image_prompt_lists_analysis_output() {
        let prompt = image_generation_prompt(&image_request(false), false, Language::Japanese);
        assert!(prompt.contains("1. 하이웨스트 팬츠\n2. 니트 카디건"));
        assert!(prompt.contains("#FFFFFF, 네이비(#1F2A44)"));
        assert!(prompt.contains("## 추천 액세서리\n골드 귀걸이"));
        assert!(prompt.contains("- **신체 고민**: 없음"));
        assert!(prompt.contains("저녁, 레스토랑에서 데이트 상황"));
        assert!(prompt.contains("Japanese"));
        assert!(prompt.ends_with("이미지 1장만 생성하세요."));
    }
}
