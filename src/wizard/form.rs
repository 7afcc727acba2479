//! The multi-step styling form as a pure state machine.
//!
//! `reduce` never performs I/O; [`crate::wizard::submit`] drives the network part.

use thiserror::Error;

use crate::models::{
    body_shapes_for, validate_style_options, BodyConcern, BodyInfo, BodyShape, BodyType,
    CoordinateRequest, CoordinateResult, Gender, Occasion, Place, ShoulderWidth, SkinTone,
    StyleOption, TimeOfDay, Tpo, MAX_STYLE_OPTIONS,
};
use crate::pipeline::AcceptedUpload;
use crate::utils::language::{Language, LanguagePreference};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormVariant {
    TextOnly,
    WithPhoto,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    BodyInfo,
    Photo,
    StyleOption,
    Tpo,
    BodyConcern,
    Result,
}

const TEXT_ONLY_STEPS: &[Step] = &[
    Step::BodyInfo,
    Step::StyleOption,
    Step::Tpo,
    Step::BodyConcern,
    Step::Result,
];

const WITH_PHOTO_STEPS: &[Step] = &[
    Step::BodyInfo,
    Step::Photo,
    Step::StyleOption,
    Step::Tpo,
    Step::BodyConcern,
    Step::Result,
];

impl FormVariant {
    pub fn steps(self) -> &'static [Step] {
        match self {
            FormVariant::TextOnly => TEXT_ONLY_STEPS,
            FormVariant::WithPhoto => WITH_PHOTO_STEPS,
        }
    }

    /// The step from which the form is submitted.
    pub fn final_input_step(self) -> Step {
        Step::BodyConcern
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FormError {
    #[error("{message}")]
    StyleLimit { message: String },
    #[error("step {0:?} is not part of this form")]
    StepNotInFlow(Step),
    #[error("there is no result to show yet")]
    ResultUnavailable,
    #[error("step {0:?} is incomplete")]
    Incomplete(Step),
    #[error("the form can only be submitted from the last input step")]
    NotAtFinalStep,
    #[error("a submission is already in flight")]
    AlreadySubmitting,
    #[error("{0}")]
    Invalid(String),
}

fn style_limit_message(language: Language) -> String {
    match language {
        Language::Korean => format!("스타일은 최대 {MAX_STYLE_OPTIONS}개까지 선택할 수 있어요"),
        Language::English => format!("You can choose up to {MAX_STYLE_OPTIONS} styles"),
        Language::Japanese => format!("スタイルは最大{MAX_STYLE_OPTIONS}つまで選択できます"),
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BodyInfoDraft {
    pub gender: Option<Gender>,
    pub height: Option<f64>,
    pub weight: Option<f64>,
    pub body_type: Option<BodyType>,
    pub skin_tone: Option<SkinTone>,
    pub shoulder_width: Option<ShoulderWidth>,
    pub body_shape: Option<BodyShape>,
}

impl BodyInfoDraft {
    /// The finished body info, if every required field is filled in and valid.
    pub fn complete(&self) -> Option<BodyInfo> {
        let info = BodyInfo {
            gender: self.gender,
            height: self.height?,
            weight: self.weight?,
            body_type: self.body_type?,
            skin_tone: self.skin_tone?,
            shoulder_width: self.shoulder_width,
            body_shape: self.body_shape,
        };
        info.validate().ok().map(|_| info)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TpoDraft {
    pub time: Option<TimeOfDay>,
    pub place: Option<Place>,
    pub occasion: Option<Occasion>,
}

impl TpoDraft {
    pub fn complete(&self) -> Option<Tpo> {
        Some(Tpo {
            time: self.time?,
            place: self.place?,
            occasion: self.occasion?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormState {
    pub variant: FormVariant,
    pub preference: LanguagePreference,
    pub step: Step,
    pub body_info: BodyInfoDraft,
    pub photo: Option<AcceptedUpload>,
    pub style_options: Vec<StyleOption>,
    pub tpo: TpoDraft,
    pub body_concerns: Vec<BodyConcern>,
    pub result: Option<CoordinateResult>,
    pub is_loading: bool,
    pub error: Option<String>,
}

impl FormState {
    pub fn new(variant: FormVariant, preference: LanguagePreference) -> Self {
        FormState {
            variant,
            preference,
            step: Step::BodyInfo,
            body_info: BodyInfoDraft::default(),
            photo: None,
            style_options: Vec::new(),
            tpo: TpoDraft::default(),
            body_concerns: Vec::new(),
            result: None,
            is_loading: false,
            error: None,
        }
    }

    /// The language for messages the form shows and for requests it sends.
    pub fn language(&self) -> Language {
        self.preference.language()
    }

    fn step_index(&self, step: Step) -> Option<usize> {
        self.variant.steps().iter().position(|candidate| *candidate == step)
    }

    pub fn is_step_complete(&self, step: Step) -> bool {
        match step {
            Step::BodyInfo => self.body_info.complete().is_some(),
            Step::Photo => self.photo.is_some(),
            Step::StyleOption => validate_style_options(&self.style_options).is_ok(),
            Step::Tpo => self.tpo.complete().is_some(),
            Step::BodyConcern => true,
            Step::Result => self.result.is_some(),
        }
    }

    /// 1-based position and total number of input steps, for a progress bar.
    pub fn progress(&self) -> (usize, usize) {
        let inputs = self.variant.steps().len() - 1;
        let position = self.step_index(self.step).map(|index| index + 1).unwrap_or(1);
        (position.min(inputs), inputs)
    }

    /// The analysis request assembled from the current answers.
    pub fn to_request(&self) -> Result<CoordinateRequest, FormError> {
        let body_info = self
            .body_info
            .complete()
            .ok_or(FormError::Incomplete(Step::BodyInfo))?;
        if self.variant == FormVariant::WithPhoto && self.photo.is_none() {
            return Err(FormError::Incomplete(Step::Photo));
        }
        let tpo = self.tpo.complete().ok_or(FormError::Incomplete(Step::Tpo))?;
        let request = CoordinateRequest {
            body_info,
            style_options: self.style_options.clone(),
            tpo,
            body_concerns: self.body_concerns.clone(),
        };
        request
            .validate()
            .map_err(|err| FormError::Invalid(err.to_string()))?;
        Ok(request)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FormAction {
    Next,
    Previous,
    GoTo(Step),
    SetLanguage(Language),
    SetGender(Option<Gender>),
    SetHeight(f64),
    SetWeight(f64),
    SetBodyType(BodyType),
    SetSkinTone(SkinTone),
    SetShoulderWidth(Option<ShoulderWidth>),
    SetBodyShape(Option<BodyShape>),
    SetPhoto(Option<AcceptedUpload>),
    SetTime(TimeOfDay),
    SetPlace(Place),
    SetOccasion(Occasion),
    ToggleStyle(StyleOption),
    ToggleConcern(BodyConcern),
    SubmitStarted,
    SubmitSucceeded(CoordinateResult),
    SubmitFailed(String),
    Reset,
}

fn toggle_style(
    mut selected: Vec<StyleOption>,
    option: StyleOption,
    language: Language,
) -> Result<Vec<StyleOption>, FormError> {
    if let Some(index) = selected.iter().position(|existing| *existing == option) {
        selected.remove(index);
    } else if selected.len() >= MAX_STYLE_OPTIONS {
        return Err(FormError::StyleLimit {
            message: style_limit_message(language),
        });
    } else {
        selected.push(option);
    }
    Ok(selected)
}

/// 없음 is exclusive: choosing it clears the rest, choosing anything else clears it.
fn toggle_concern(mut selected: Vec<BodyConcern>, concern: BodyConcern) -> Vec<BodyConcern> {
    if concern == BodyConcern::None {
        return if selected.contains(&BodyConcern::None) {
            Vec::new()
        } else {
            vec![BodyConcern::None]
        };
    }
    selected.retain(|existing| *existing != BodyConcern::None);
    if let Some(index) = selected.iter().position(|existing| *existing == concern) {
        selected.remove(index);
    } else {
        selected.push(concern);
    }
    selected
}

pub fn reduce(state: FormState, action: FormAction) -> Result<FormState, FormError> {
    let mut next = state;
    match action {
        FormAction::Next => {
            let final_step = next.variant.final_input_step();
            if next.step == Step::Result || next.step == final_step {
                return Ok(next);
            }
            if !next.is_step_complete(next.step) {
                return Err(FormError::Incomplete(next.step));
            }
            if let Some(index) = next.step_index(next.step) {
                next.step = next.variant.steps()[index + 1];
            }
        }
        FormAction::Previous => {
            if let Some(index) = next.step_index(next.step) {
                if index > 0 {
                    next.step = next.variant.steps()[index - 1];
                }
            }
        }
        FormAction::GoTo(step) => {
            if next.step_index(step).is_none() {
                return Err(FormError::StepNotInFlow(step));
            }
            if step == Step::Result && next.result.is_none() {
                return Err(FormError::ResultUnavailable);
            }
            next.step = step;
        }
        FormAction::SetLanguage(language) => {
            next.preference.set(language);
        }
        FormAction::SetGender(gender) => {
            next.body_info.gender = gender;
            let shape_still_offered = match (gender, next.body_info.body_shape) {
                (Some(gender), Some(shape)) => body_shapes_for(gender).contains(&shape),
                (None, Some(_)) => false,
                (_, None) => true,
            };
            if !shape_still_offered {
                next.body_info.body_shape = None;
            }
        }
        FormAction::SetHeight(height) => next.body_info.height = Some(height),
        FormAction::SetWeight(weight) => next.body_info.weight = Some(weight),
        FormAction::SetBodyType(body_type) => next.body_info.body_type = Some(body_type),
        FormAction::SetSkinTone(skin_tone) => next.body_info.skin_tone = Some(skin_tone),
        FormAction::SetShoulderWidth(width) => next.body_info.shoulder_width = width,
        FormAction::SetBodyShape(shape) => {
            if let Some(shape) = shape {
                let offered = next
                    .body_info
                    .gender
                    .map(|gender| body_shapes_for(gender).contains(&shape))
                    .unwrap_or(false);
                if !offered {
                    return Err(FormError::Invalid(format!(
                        "body shape {shape} is not offered for the selected gender"
                    )));
                }
            }
            next.body_info.body_shape = shape;
        }
        FormAction::SetPhoto(photo) => next.photo = photo,
        FormAction::SetTime(time) => next.tpo.time = Some(time),
        FormAction::SetPlace(place) => next.tpo.place = Some(place),
        FormAction::SetOccasion(occasion) => next.tpo.occasion = Some(occasion),
        FormAction::ToggleStyle(option) => {
            next.style_options =
                toggle_style(std::mem::take(&mut next.style_options), option, next.language())?;
        }
        FormAction::ToggleConcern(concern) => {
            next.body_concerns = toggle_concern(std::mem::take(&mut next.body_concerns), concern);
        }
        FormAction::SubmitStarted => {
            if next.is_loading {
                return Err(FormError::AlreadySubmitting);
            }
            if next.step != next.variant.final_input_step() {
                return Err(FormError::NotAtFinalStep);
            }
            next.to_request()?;
            next.is_loading = true;
            next.error = None;
        }
        FormAction::SubmitSucceeded(result) => {
            next.is_loading = false;
            next.error = None;
            next.result = Some(result);
            next.step = Step::Result;
        }
        FormAction::SubmitFailed(message) => {
            next.is_loading = false;
            next.error = Some(message);
        }
        FormAction::Reset => next = FormState::new(next.variant, next.preference),
    }
    Ok(next)
}
