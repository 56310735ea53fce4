//! Overlap detector for hosts without a physics layer.

use devour_core::{Command, DVec2, WorldView};

/// Reports every agent overlapping another entity as a contact.
///
/// Entities are treated as circles whose diameter equals their size. Both
/// orderings of an agent pair are reported; the world decides which, if any,
/// may absorb the other.
pub fn detect(view: &WorldView, out: &mut Vec<Command>) {
    for actor in view.agents() {
        for other in view.agents() {
            if other.id != actor.id && touching(actor.position, actor.size, other.position, other.size)
            {
                out.push(Command::ReportContact {
                    actor: actor.id,
                    target: other.id,
                });
            }
        }
        for food in view.food() {
            if touching(actor.position, actor.size, food.position, food.size) {
                out.push(Command::ReportContact {
                    actor: actor.id,
                    target: food.id,
                });
            }
        }
    }
}

fn touching(left: DVec2, left_size: f64, right: DVec2, right_size: f64) -> bool {
    let reach = (left_size + right_size) * 0.5;
    left.distance_squared(right) <= reach * reach
}

#[cfg(test)]
mod tests {
    use super::*;
    use devour_core::{AgentSnapshot, Category, EntityId, FoodKind, FoodSnapshot};

    fn agent(slot: u32, x: f64, size: f64) -> AgentSnapshot {
        AgentSnapshot {
            id: EntityId::new(Category::Bot, slot, 0),
            position: DVec2::new(x, 0.0),
            velocity: DVec2::ZERO,
            size,
        }
    }

    #[test]
    fn overlapping_entities_are_reported_from_each_agent() {
        let food = FoodSnapshot {
            id: EntityId::new(Category::Food(FoodKind::new(0)), 0, 0),
            position: DVec2::new(0.6, 0.0),
            size: 0.5,
            worth: 1.0,
        };
        let view = WorldView::from_snapshots(
            vec![agent(0, 0.0, 1.0), agent(1, 1.0, 1.0), agent(2, 10.0, 1.0)],
            vec![food],
        );
        let mut contacts = Vec::new();

        detect(&view, &mut contacts);

        let bot = |slot| EntityId::new(Category::Bot, slot, 0);
        assert_eq!(
            contacts,
            vec![
                Command::ReportContact {
                    actor: bot(0),
                    target: bot(1),
                },
                Command::ReportContact {
                    actor: bot(0),
                    target: food.id,
                },
                Command::ReportContact {
                    actor: bot(1),
                    target: bot(0),
                },
                Command::ReportContact {
                    actor: bot(1),
                    target: food.id,
                },
            ]
        );
    }
}
