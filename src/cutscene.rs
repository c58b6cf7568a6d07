use std::f32::consts::{FRAC_PI_2, FRAC_PI_4};
use std::time::Duration;

use glam::Vec3;

use crate::sequence::{Completion, PropId, PropSetup, PropShape, Step, StepOp, StepSequence};

const READY_MESSAGE: &str = "Your cigarette is ready!";

fn place(prop: PropId, x: f32, y: f32, z: f32) -> StepOp {
    StepOp::Place {
        prop,
        offset: Vec3::new(x, y, z),
    }
}

fn tilt(prop: PropId, x: f32) -> StepOp {
    StepOp::Rotate {
        prop,
        rotation: Vec3::new(x, 0.0, 0.0),
    }
}

fn hands(y: f32, spread: f32) -> [StepOp; 2] {
    [
        place(PropId::LeftHand, -spread, y, -0.6),
        place(PropId::RightHand, spread, y, -0.6),
    ]
}

fn step(name: &str, millis: u64, message: &str, ops: Vec<StepOp>) -> Step {
    Step {
        name: name.to_string(),
        duration: Duration::from_millis(millis),
        ops,
        message: Some(message.to_string()),
    }
}

fn setup(prop: PropId, x: f32, y: f32, z: f32, visible: bool) -> PropSetup {
    PropSetup {
        prop,
        offset: Vec3::new(x, y, z),
        visible,
    }
}

/// Hands rolling the deposited ingredients into a finished unit.
///
/// Eleven steps, 19 seconds in total. Completes with [`Completion::Crafted`].
pub fn crafting_cutscene() -> StepSequence {
    use PropId::*;

    let props = vec![
        setup(LeftHand, -0.3, -0.5, -0.8, true),
        setup(RightHand, 0.3, -0.5, -0.8, true),
        setup(Paper, 0.0, -1.0, -1.0, false),
        setup(Tobacco, 0.5, -1.0, -1.0, false),
        setup(Taga, -0.5, -1.0, -1.0, false),
        setup(Filter, 0.0, -1.0, -1.0, false),
        setup(Crafted, 0.0, -1.0, -1.0, false),
    ];

    let take_paper = step(
        "takePaper",
        1500,
        "Taking out a rolling paper...",
        vec![
            place(Paper, 0.0, -0.3, -0.7),
            tilt(Paper, -FRAC_PI_4),
            StepOp::Show(Paper),
        ],
    );

    let mut prepare_paper = vec![place(Paper, 0.0, -0.4, -0.6), tilt(Paper, -FRAC_PI_2)];
    prepare_paper.extend(hands(-0.4, 0.2));

    let mut start_rolling = hands(-0.4, 0.15).to_vec();
    start_rolling.extend([
        StepOp::Scale {
            prop: Paper,
            factor: 0.9,
        },
        StepOp::Hide(Tobacco),
        StepOp::Hide(Taga),
    ]);

    let mut continue_rolling = vec![
        StepOp::Reshape {
            prop: Paper,
            shape: PropShape::Rolled,
        },
        tilt(Paper, FRAC_PI_2),
    ];
    continue_rolling.extend(hands(-0.4, 0.1));

    let mut finish_rolling = vec![
        StepOp::Hide(Filter),
        place(Crafted, 0.0, -0.4, -0.6),
        tilt(Crafted, FRAC_PI_2),
        StepOp::Show(Crafted),
        StepOp::Hide(Paper),
    ];
    finish_rolling.extend(hands(-0.4, 0.1));

    let mut admire = vec![place(Crafted, 0.0, -0.3, -0.6)];
    admire.extend(hands(-0.3, 0.1));
    let admire_result = step("admireResult", 2000, READY_MESSAGE, admire);

    let steps = vec![
        take_paper,
        step(
            "preparePaper",
            1500,
            "You pinch the paper between your fingers...",
            prepare_paper,
        ),
        step(
            "takeTobacco",
            1500,
            "You grab your tobacco...",
            vec![
                place(Tobacco, 0.3, -0.2, -0.5),
                StepOp::Show(Tobacco),
                place(RightHand, 0.3, -0.3, -0.5),
            ],
        ),
        step(
            "placeTobacco",
            2000,
            "You spread the tobacco over the paper...",
            vec![
                place(Tobacco, 0.0, -0.39, -0.6),
                StepOp::Scale {
                    prop: Tobacco,
                    factor: 0.7,
                },
                place(RightHand, 0.2, -0.4, -0.6),
            ],
        ),
        step(
            "takeTaga",
            1500,
            "You add a pinch of taga...",
            vec![
                place(Taga, -0.3, -0.2, -0.5),
                StepOp::Show(Taga),
                place(LeftHand, -0.3, -0.3, -0.5),
            ],
        ),
        step(
            "placeTaga",
            1500,
            "You work it into the tobacco...",
            vec![
                place(Taga, 0.0, -0.38, -0.6),
                StepOp::Scale {
                    prop: Taga,
                    factor: 0.5,
                },
                place(LeftHand, -0.2, -0.4, -0.6),
            ],
        ),
        step("startRolling", 2000, "You start rolling...", start_rolling),
        step(
            "continueRolling",
            2000,
            "You shape an even cylinder...",
            continue_rolling,
        ),
        step(
            "addFilter",
            1500,
            "You slide the filter in...",
            vec![
                place(Filter, -0.2, -0.4, -0.6),
                tilt(Filter, FRAC_PI_2),
                StepOp::Show(Filter),
                place(LeftHand, -0.2, -0.4, -0.6),
            ],
        ),
        step(
            "finishRolling",
            2000,
            "You lick the paper and seal it...",
            finish_rolling,
        ),
        admire_result,
    ];

    StepSequence {
        name: "crafting".into(),
        props,
        steps,
        completion: Completion::Crafted,
    }
}
