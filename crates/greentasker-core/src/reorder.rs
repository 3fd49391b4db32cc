use tracing::debug;

use crate::task::Task;

/// List-move: removes the element at `from` and reinserts it at `to`.
/// Elements in between shift by one. Out-of-range indices leave the slice untouched.
pub fn move_item<T>(items: &mut [T], from: usize, to: usize) {
    if from >= items.len() || to >= items.len() || from == to {
        return;
    }

    if from < to {
        items[from..=to].rotate_left(1);
    } else {
        items[to..=from].rotate_right(1);
    }
}

/// Moves the task with id `source` to the position currently held by `target`.
/// Returns `false` when either id is missing or both are the same.
pub fn reorder_by_id(tasks: &mut [Task], source: &str, target: &str) -> bool {
    if source == target {
        return false;
    }

    let Some(from) = tasks.iter().position(|task| task.id == source) else {
        debug!(source, "reorder source not in list");
        return false;
    };
    let Some(to) = tasks.iter().position(|task| task.id == target) else {
        debug!(target, "reorder target not in list");
        return false;
    };

    move_item(tasks, from, to);
    debug!(from, to, "moved task");
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tasks(ids: &[&str]) -> Vec<Task> {
        ids.iter()
            .map(|id| Task {
                id: id.to_string(),
                title: format!("task {id}"),
                completed: false,
                due_date: None,
            })
            .collect()
    }

    fn ids(tasks: &[Task]) -> Vec<&str> {
        tasks.iter().map(|task| task.id.as_str()).collect()
    }

    #[test]
    fn moves_first_to_last() {
        let mut list = tasks(&["A", "B", "C"]);
        assert!(reorder_by_id(&mut list, "A", "C"));
        assert_eq!(ids(&list), ["B", "C", "A"]);
    }

    #[test]
    fn moves_last_to_first() {
        let mut list = tasks(&["A", "B", "C"]);
        assert!(reorder_by_id(&mut list, "C", "A"));
        assert_eq!(ids(&list), ["C", "A", "B"]);
    }

    #[test]
    fn adjacent_move_swaps_neighbours() {
        let mut list = tasks(&["A", "B", "C", "D"]);
        assert!(reorder_by_id(&mut list, "B", "C"));
        assert_eq!(ids(&list), ["A", "C", "B", "D"]);
        assert!(reorder_by_id(&mut list, "D", "C"));
        assert_eq!(ids(&list), ["A", "D", "C", "B"]);
    }

    #[test]
    fn move_is_not_symmetric_for_distant_items() {
        let mut list = tasks(&["A", "B", "C", "D"]);
        reorder_by_id(&mut list, "A", "C");
        assert_eq!(ids(&list), ["B", "C", "A", "D"]);
        reorder_by_id(&mut list, "C", "A");
        assert_eq!(ids(&list), ["B", "A", "C", "D"]);
    }

    #[test]
    fn unknown_or_identical_ids_are_noops() {
        let mut list = tasks(&["A", "B", "C"]);
        assert!(!reorder_by_id(&mut list, "A", "A"));
        assert!(!reorder_by_id(&mut list, "X", "A"));
        assert!(!reorder_by_id(&mut list, "A", "X"));
        assert_eq!(ids(&list), ["A", "B", "C"]);
    }

    #[test]
    fn every_move_is_a_permutation() {
        let names = ["A", "B", "C", "D", "E"];
        for source in names {
            for target in names {
                let mut list = tasks(&names);
                reorder_by_id(&mut list, source, target);
                assert_eq!(list.len(), names.len());
                let mut sorted = ids(&list);
                sorted.sort_unstable();
                assert_eq!(sorted, names);
                let to = names.iter().position(|id| *id == target).expect("target");
                assert_eq!(list[to].id, source);
            }
        }
    }

    #[test]
    fn move_item_ignores_out_of_range() {
        let mut values = [1, 2, 3];
        move_item(&mut values, 5, 0);
        move_item(&mut values, 0, 3);
        assert_eq!(values, [1, 2, 3]);
    }
}
