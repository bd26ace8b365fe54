//! Dashboard overlay: gear, speed, rpm, race timer and checkpoints

use bevy::prelude::*;

use super::components::{HudText, SimWorldResource};

pub fn setup_hud(mut commands: Commands) {
    commands
        .spawn((
            Node {
                width: Val::Auto,
                height: Val::Auto,
                position_type: PositionType::Absolute,
                bottom: Val::Px(10.0),
                right: Val::Px(10.0),
                padding: UiRect::all(Val::Px(10.0)),
                flex_direction: FlexDirection::Column,
                row_gap: Val::Px(5.0),
                ..default()
            },
            BackgroundColor(Color::srgba(0.0, 0.0, 0.0, 0.7)),
        ))
        .with_children(|parent| {
            let fields = [
                (HudText::Timer, "3", 28.0, Color::srgb(1.0, 1.0, 0.5)),
                (HudText::Gear, "N", 24.0, Color::srgb(0.2, 1.0, 0.2)),
                (HudText::Speed, "0 km/h", 18.0, Color::srgb(0.9, 0.9, 0.9)),
                (HudText::Rpm, "0 rpm", 14.0, Color::srgb(0.9, 0.9, 0.9)),
                (HudText::Checkpoints, "Goal(s): 0", 14.0, Color::srgb(0.9, 0.9, 0.9)),
            ];
            for (field, initial, font_size, color) in fields {
                parent.spawn((
                    Text::new(initial),
                    TextFont {
                        font_size,
                        ..default()
                    },
                    TextColor(color),
                    field,
                ));
            }
        });
}

pub fn update_hud_text(
    sim_world: Res<SimWorldResource>,
    mut text_query: Query<(&HudText, &mut Text)>,
) {
    let world = &sim_world.0;
    let readout = world.dashboard();

    for (field, mut text) in text_query.iter_mut() {
        **text = match field {
            HudText::Gear => readout.gear.clone(),
            HudText::Speed => format!("{} km/h", readout.speed_kmh),
            HudText::Rpm => format!("{} rpm", readout.rpm),
            HudText::Timer if world.timer.is_game_over() => "Game Over".to_string(),
            HudText::Timer => world.timer.display(),
            HudText::Checkpoints => world.checkpoints.display(),
        };
    }
}
