use crate::model::{Task, TaskStatus};

struct SeedTask {
    name: &'static str,
    category: &'static str,
    status: TaskStatus,
    priority: i64,
    start_time: &'static str,
    duration: u32,
    notes: &'static str,
    ingredients: &'static [&'static str],
}

const THANKSGIVING_PLAN: [SeedTask; 7] = [
    SeedTask {
        name: "Brine the turkey",
        category: "prep",
        status: TaskStatus::Completed,
        priority: 1,
        start_time: "7:00 AM",
        duration: 30,
        notes: "Needs the large cooler",
        ingredients: &["turkey", "salt", "brown sugar", "peppercorns"],
    },
    SeedTask {
        name: "Roast the turkey",
        category: "main",
        status: TaskStatus::InProgress,
        priority: 2,
        start_time: "10:00 AM",
        duration: 240,
        notes: "Baste every 45 minutes",
        ingredients: &["turkey", "butter", "thyme"],
    },
    SeedTask {
        name: "Mashed potatoes",
        category: "side",
        status: TaskStatus::Planned,
        priority: 3,
        start_time: "1:00 PM",
        duration: 45,
        notes: "",
        ingredients: &["potatoes", "butter", "cream"],
    },
    SeedTask {
        name: "Green bean casserole",
        category: "side",
        status: TaskStatus::Planned,
        priority: 3,
        start_time: "1:30 PM",
        duration: 40,
        notes: "",
        ingredients: &["green beans", "mushroom soup", "fried onions"],
    },
    SeedTask {
        name: "Cranberry sauce",
        category: "side",
        status: TaskStatus::Planned,
        priority: 4,
        start_time: "11:00 AM",
        duration: 20,
        notes: "Can be made the day before",
        ingredients: &["cranberries", "sugar", "orange zest"],
    },
    SeedTask {
        name: "Pumpkin pie",
        category: "dessert",
        status: TaskStatus::Completed,
        priority: 5,
        start_time: "8:00 AM",
        duration: 75,
        notes: "",
        ingredients: &["pumpkin", "eggs", "evaporated milk", "pie crust"],
    },
    SeedTask {
        name: "Mulled cider",
        category: "beverage",
        status: TaskStatus::Planned,
        priority: 6,
        start_time: "3:00 PM",
        duration: 30,
        notes: "",
        ingredients: &["apple cider", "cinnamon", "cloves"],
    },
];

/// The default meal plan written into a fresh store. Ids start at 1.
pub fn default_tasks(created_at: &str) -> Vec<Task> {
    THANKSGIVING_PLAN
        .iter()
        .zip(1u64..)
        .map(|(seed, id)| Task {
            id,
            name: seed.name.to_string(),
            category: seed.category.to_string(),
            status: seed.status,
            priority: seed.priority,
            start_time: Some(seed.start_time.to_string()),
            duration: Some(seed.duration),
            notes: (!seed.notes.is_empty()).then(|| seed.notes.to_string()),
            assigned_to: None,
            ingredients: seed.ingredients.iter().map(|item| item.to_string()).collect(),
            created_at: created_at.to_string(),
        })
        .collect()
}
